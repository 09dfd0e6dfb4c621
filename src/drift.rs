//! Drift detection between recorded context files and generated scripts.
//!
//! Both sides are compared with spaces, tabs and carriage returns removed,
//! since the generator only reformats whitespace between runs. Only added or altered script
//! content counts as drift; lines that merely vanished are ignored.
use crate::error::SessionError;
use crate::merge::merge_context_file;
use crate::staging::collect_files_recursive;
use anyhow::{Context, Result};
use serde::Serialize;
use similar::{DiffTag, TextDiff};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SCRIPT_EXTENSION: &str = "v";
pub const CONTEXT_EXTENSION: &str = "ctx";
pub const REPORT_EXTENSION: &str = "diff";

const DIFF_CONTEXT_LINES: usize = 1;

/// Paths known for one proof unit, keyed in `ArtifactIndex` by base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPair {
    pub script: PathBuf,
    pub context: PathBuf,
    pub report: PathBuf,
}

/// Script/context/report paths for every script under the proof tree.
#[derive(Debug, Default)]
pub struct ArtifactIndex {
    pairs: BTreeMap<PathBuf, ArtifactPair>,
}

impl ArtifactIndex {
    pub fn scan(proof_dir: &Path, report_dir: &Path) -> Result<Self> {
        let mut pairs = BTreeMap::new();
        for script in collect_files_recursive(proof_dir)? {
            if script.extension().and_then(|ext| ext.to_str()) != Some(SCRIPT_EXTENSION) {
                continue;
            }
            let Some(stem) = script.file_stem() else {
                continue;
            };
            let key = script
                .strip_prefix(proof_dir)
                .unwrap_or(&script)
                .with_extension("");
            let mut report_name = stem.to_os_string();
            report_name.push(".");
            report_name.push(REPORT_EXTENSION);
            let report = report_dir.join(report_name);
            pairs.insert(
                key,
                ArtifactPair {
                    context: script.with_extension(CONTEXT_EXTENSION),
                    script,
                    report,
                },
            );
        }
        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&PathBuf, &ArtifactPair)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Summary of one traversal of the proof tree.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DriftOutcome {
    pub checked: usize,
    pub merged: usize,
    pub reports: Vec<PathBuf>,
}

/// Drop intra-line whitespace. `\r` goes too, so CRLF and LF copies of a
/// file normalize to the same lines.
pub fn strip_blanks(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, ' ' | '\t' | '\r'))
        .collect()
}

/// Unified diff of the normalized texts, if the script side adds anything.
pub fn drift_diff(context: &str, script: &str, from_label: &str, to_label: &str) -> Option<String> {
    let old = strip_blanks(context);
    let new = strip_blanks(script);
    let diff = TextDiff::from_lines(&old, &new);
    let added = diff
        .ops()
        .iter()
        .any(|op| matches!(op.tag(), DiffTag::Insert | DiffTag::Replace));
    if !added {
        return None;
    }
    Some(
        diff.unified_diff()
            .context_radius(DIFF_CONTEXT_LINES)
            .header(from_label, to_label)
            .to_string(),
    )
}

/// Compare one pair and append a report when drift is found.
pub fn check_pair(pair: &ArtifactPair) -> Result<bool> {
    let context = fs::read_to_string(&pair.context)
        .map_err(|err| SessionError::from_io(&pair.context, err))?;
    let script = fs::read_to_string(&pair.script)
        .map_err(|err| SessionError::from_io(&pair.script, err))?;
    let Some(diff) = drift_diff(
        &context,
        &script,
        &pair.context.display().to_string(),
        &pair.script.display().to_string(),
    ) else {
        return Ok(false);
    };
    if let Some(parent) = pair.report.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut report = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&pair.report)
        .with_context(|| format!("open {}", pair.report.display()))?;
    report
        .write_all(diff.as_bytes())
        .with_context(|| format!("write {}", pair.report.display()))?;
    tracing::warn!(
        context = %pair.context.display(),
        report = %pair.report.display(),
        "generated script drifted from recorded context"
    );
    Ok(true)
}

/// Check every pair under `proof_dir`, merging afterwards when `merge` is set.
pub fn sync_artifacts(proof_dir: &Path, report_dir: &Path, merge: bool) -> Result<DriftOutcome> {
    let index = ArtifactIndex::scan(proof_dir, report_dir)?;
    let mut outcome = DriftOutcome::default();
    for (_, pair) in index.pairs() {
        if check_pair(pair)? && !outcome.reports.contains(&pair.report) {
            outcome.reports.push(pair.report.clone());
        }
        outcome.checked += 1;
        if merge {
            merge_context_file(&pair.context, &pair.script)?;
            outcome.merged += 1;
        }
    }
    tracing::info!(
        checked = outcome.checked,
        merged = outcome.merged,
        reports = outcome.reports.len(),
        "drift check complete"
    );
    Ok(outcome)
}

/// Merge every script under `proof_dir` into its context file, without
/// checking for drift. Returns the number of contexts rewritten.
pub fn refresh_contexts(proof_dir: &Path) -> Result<usize> {
    let index = ArtifactIndex::scan(proof_dir, proof_dir)?;
    for (_, pair) in index.pairs() {
        merge_context_file(&pair.context, &pair.script)?;
    }
    tracing::info!(refreshed = index.len(), "context files refreshed");
    Ok(index.len())
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod tests;
