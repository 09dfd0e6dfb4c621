//! Body-visibility rewrite for the disposable copy of the source tree.
//!
//! Two rules keyed on the `--  #BODYMODE` marker comment:
//! an `SPARK_Mode => Off` aspect is switched to `On`, and a standalone
//! `pragma SPARK_Mode (Off);` line is blanked. Line slots and terminators are
//! kept so `file:line` check identifiers stay valid.
use crate::error::SessionError;
use crate::staging::{collect_files_recursive, replace_file};
use anyhow::{Context, Result};
use regex::bytes::Regex;
use std::fs;
use std::path::Path;

pub const BODY_MODE_MARKER: &str = "--  #BODYMODE";

#[derive(Debug, Clone)]
pub struct SourceTransformer {
    enable: Regex,
    strip: Regex,
}

/// Outcome of rewriting a single file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub enabled: usize,
    pub stripped: usize,
}

impl RewriteStats {
    pub fn changed(&self) -> bool {
        self.enabled + self.stripped > 0
    }
}

impl SourceTransformer {
    pub fn new() -> Result<Self> {
        Self::with_marker(BODY_MODE_MARKER)
    }

    /// Rules keyed on a different marker comment, matched literally.
    pub fn with_marker(marker: &str) -> Result<Self> {
        let marker = regex::escape(marker);
        let enable = Regex::new(&format!(r"(?i)(SPARK_Mode\s*=>\s*)Off(\s*{marker}\s*)$"))
            .context("compile enable pattern")?;
        let strip = Regex::new(&format!(
            r"(?i)^\s*pragma\s+SPARK_Mode\s*\(\s*Off\s*\)\s*;\s*{marker}\s*$"
        ))
        .context("compile strip pattern")?;
        Ok(Self { enable, strip })
    }

    /// Rewrite one line, terminator included.
    pub fn rewrite_line(&self, line: &[u8], stats: &mut RewriteStats) -> Vec<u8> {
        if self.enable.is_match(line) {
            stats.enabled += 1;
            return self.enable.replace(line, &b"${1}On${2}"[..]).into_owned();
        }
        if self.strip.is_match(line) {
            stats.stripped += 1;
            return line_terminator(line).to_vec();
        }
        line.to_vec()
    }

    pub fn rewrite_bytes(&self, contents: &[u8]) -> (Vec<u8>, RewriteStats) {
        let mut stats = RewriteStats::default();
        let mut out = Vec::with_capacity(contents.len());
        for line in contents.split_inclusive(|byte| *byte == b'\n') {
            out.extend(self.rewrite_line(line, &mut stats));
        }
        (out, stats)
    }

    /// Rewrite one file in place. Untouched files are not rewritten.
    pub fn rewrite_file(&self, path: &Path) -> Result<RewriteStats> {
        let contents = fs::read(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => SessionError::MissingFile {
                path: path.to_path_buf(),
            },
            _ => SessionError::Rewrite {
                path: path.to_path_buf(),
                source: err,
            },
        })?;
        let (rewritten, stats) = self.rewrite_bytes(&contents);
        if stats.changed() {
            replace_file(path, &rewritten)
                .with_context(|| format!("rewrite {}", path.display()))?;
            tracing::debug!(
                path = %path.display(),
                enabled = stats.enabled,
                stripped = stats.stripped,
                "rewrote body-mode markers"
            );
        }
        Ok(stats)
    }

    /// Rewrite every regular file below `root`.
    pub fn rewrite_tree(&self, root: &Path) -> Result<RewriteStats> {
        let mut total = RewriteStats::default();
        let files = collect_files_recursive(root)?;
        for file in &files {
            let stats = self.rewrite_file(file)?;
            total.enabled += stats.enabled;
            total.stripped += stats.stripped;
        }
        tracing::info!(
            root = %root.display(),
            files = files.len(),
            enabled = total.enabled,
            stripped = total.stripped,
            "body mode enabled in source copy"
        );
        Ok(total)
    }
}

fn line_terminator(line: &[u8]) -> &[u8] {
    if line.ends_with(b"\r\n") {
        &line[line.len() - 2..]
    } else if line.ends_with(b"\n") {
        &line[line.len() - 1..]
    } else {
        &[]
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
