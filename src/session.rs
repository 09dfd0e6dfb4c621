//! Phase-sequenced regeneration of the proof session.
//!
//! Phases run strictly in the order of `SessionPhase::ALL`; each one reads
//! what the previous ones left on disk. The first failing phase stops the
//! run and nothing is rolled back.
//!
//! The prover cannot extend an existing session with new check names, it can
//! only re-derive one from the worklist. That is why the targeted pass runs
//! twice: once before drift validation to produce the scripts and register
//! their names, and again after the clean rebuild to replay the manual proofs
//! and re-register the names the rebuild dropped.
use crate::check::Worklist;
use crate::command::{BuildTarget, CommandBuilder};
use crate::config::{SessionLayout, ToolEnvironment};
use crate::drift::{self, sync_artifacts, DriftOutcome};
use crate::runner::ToolRunner;
use crate::staging::remove_dir_if_exists;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const SHAPES_PREFIX: &str = "why3shapes";
const BACKUP_EXTENSION: &str = "bak";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Cleanup,
    ForceRegenerate,
    ValidateDrift,
    RebuildClean,
    ReplayManual,
    AutomaticSweep,
    Summarize,
}

impl SessionPhase {
    pub const ALL: [SessionPhase; 7] = [
        SessionPhase::Cleanup,
        SessionPhase::ForceRegenerate,
        SessionPhase::ValidateDrift,
        SessionPhase::RebuildClean,
        SessionPhase::ReplayManual,
        SessionPhase::AutomaticSweep,
        SessionPhase::Summarize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cleanup => "cleanup",
            Self::ForceRegenerate => "force_regenerate",
            Self::ValidateDrift => "validate_drift",
            Self::RebuildClean => "rebuild_clean",
            Self::ReplayManual => "replay_manual",
            Self::AutomaticSweep => "automatic_sweep",
            Self::Summarize => "summarize",
        }
    }

    fn banner(self) -> &'static str {
        match self {
            Self::Cleanup => "Cleanup previous artifacts",
            Self::ForceRegenerate => "Generate the Coq proof files",
            Self::ValidateDrift => "Compare generated proof files with recorded contexts",
            Self::RebuildClean => "Check and register Coq proofs",
            Self::ReplayManual => "Replay manual proofs",
            Self::AutomaticSweep => "Prove remaining checks with automatic provers",
            Self::Summarize => "Summarize all proved checks",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSummary {
    pub phases: Vec<SessionPhase>,
    pub targeted_runs: usize,
    pub drift: DriftOutcome,
    pub removed_cache_files: Vec<PathBuf>,
    /// Context files merged after the last phase; zero unless requested.
    pub refreshed_contexts: usize,
}

pub struct SessionOrchestrator<'a> {
    layout: &'a SessionLayout,
    runner: &'a mut dyn ToolRunner,
    commands: CommandBuilder,
    env: ToolEnvironment,
    refresh_contexts: bool,
    summary: SessionSummary,
}

impl<'a> SessionOrchestrator<'a> {
    pub fn new(
        layout: &'a SessionLayout,
        runner: &'a mut dyn ToolRunner,
        env: ToolEnvironment,
    ) -> Self {
        let config = layout.config();
        let commands = CommandBuilder::new(
            &config.prover_program,
            &config.build_program,
            layout.project_file_name(),
        );
        Self {
            layout,
            runner,
            commands,
            env,
            refresh_contexts: false,
            summary: SessionSummary::default(),
        }
    }

    /// Merge regenerated headers into the context files once every phase has
    /// passed. Drift validation itself never merges.
    pub fn refresh_contexts(mut self, refresh: bool) -> Self {
        self.refresh_contexts = refresh;
        self
    }

    pub fn run(mut self, worklist: &Worklist) -> Result<SessionSummary> {
        tracing::info!(
            checks = worklist.len(),
            root = %self.layout.root().display(),
            "starting session regeneration"
        );
        for phase in SessionPhase::ALL {
            let span = tracing::info_span!("phase", phase = phase.as_str());
            let _entered = span.enter();
            tracing::info!("{}", phase.banner());
            self.run_phase(phase, worklist)
                .with_context(|| format!("phase {phase} failed"))?;
            self.summary.phases.push(phase);
        }
        if self.refresh_contexts {
            self.summary.refreshed_contexts = drift::refresh_contexts(&self.layout.proof_dir())
                .context("refresh context files")?;
        }
        Ok(self.summary)
    }

    fn run_phase(&mut self, phase: SessionPhase, worklist: &Worklist) -> Result<()> {
        match phase {
            SessionPhase::Cleanup => self.cleanup(),
            SessionPhase::ForceRegenerate | SessionPhase::ReplayManual => {
                self.force_regenerate(worklist)
            }
            SessionPhase::ValidateDrift => self.validate_drift(),
            SessionPhase::RebuildClean => self.rebuild_clean(),
            SessionPhase::AutomaticSweep => self.automatic_sweep(),
            SessionPhase::Summarize => self.summarize(),
        }
    }

    fn cleanup(&mut self) -> Result<()> {
        for dir in [self.layout.sessions_dir(), self.layout.report_dir()] {
            if remove_dir_if_exists(&dir)? {
                tracing::info!(path = %dir.display(), "deleted previous artifacts");
            }
        }
        let report_dir = self.layout.report_dir();
        fs::create_dir_all(&report_dir)
            .with_context(|| format!("create {}", report_dir.display()))?;
        self.runner
            .run(&self.commands.build(BuildTarget::Clean), &self.env)?;
        // Library sources are regenerated locally from here on.
        self.env.treat_library_as_installed = false;
        Ok(())
    }

    /// Requires a worklist-complete pass: the session is re-derived, never extended.
    fn force_regenerate(&mut self, worklist: &Worklist) -> Result<()> {
        for check in worklist.checks() {
            self.runner.run(&self.commands.targeted(check), &self.env)?;
            self.summary.targeted_runs += 1;
        }
        Ok(())
    }

    fn validate_drift(&mut self) -> Result<()> {
        let outcome = sync_artifacts(&self.layout.proof_dir(), &self.layout.report_dir(), false)?;
        if !outcome.reports.is_empty() {
            tracing::warn!(
                reports = outcome.reports.len(),
                dir = %self.layout.report_dir().display(),
                "review drift reports before trusting this session"
            );
        }
        self.summary.drift = outcome;
        Ok(())
    }

    fn rebuild_clean(&mut self) -> Result<()> {
        let config = self.layout.config();
        self.runner
            .run(&self.commands.build(BuildTarget::Clean), &self.env)?;
        self.runner
            .run(&self.commands.build(BuildTarget::Generate), &self.env)?;
        let smoke = self.commands.automatic(
            std::slice::from_ref(&config.smoke_prover),
            Some(config.smoke_level),
            None,
        );
        self.runner.run(&smoke, &self.env)
    }

    fn automatic_sweep(&mut self) -> Result<()> {
        let config = self.layout.config();
        let sweep = self.commands.automatic(
            config.sweep_provers.as_slice(),
            None,
            Some(config.sweep_timeout_secs),
        );
        self.runner.run(&sweep, &self.env)
    }

    fn summarize(&mut self) -> Result<()> {
        let report = self
            .commands
            .raw_options(&self.layout.config().summary_options)?;
        self.runner.run(&report, &self.env)?;
        self.summary.removed_cache_files = remove_session_caches(&self.layout.sessions_dir())?;
        Ok(())
    }
}

/// Delete shape caches and backups from each session subdirectory.
pub fn remove_session_caches(sessions_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    if !sessions_dir.is_dir() {
        return Ok(removed);
    }
    let mut units = Vec::new();
    for entry in fs::read_dir(sessions_dir)
        .with_context(|| format!("read {}", sessions_dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            units.push(entry.path());
        }
    }
    units.sort();
    for unit in units {
        let mut files = Vec::new();
        for entry in fs::read_dir(&unit).with_context(|| format!("read {}", unit.display()))? {
            let entry = entry?;
            if entry.file_type()?.is_file() && is_session_cache(&entry.path()) {
                files.push(entry.path());
            }
        }
        files.sort();
        for file in files {
            fs::remove_file(&file).with_context(|| format!("remove {}", file.display()))?;
            tracing::info!(path = %file.display(), "deleted session cache file");
            removed.push(file);
        }
    }
    Ok(removed)
}

fn is_session_cache(path: &Path) -> bool {
    let name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
    name.starts_with(SHAPES_PREFIX)
        || path.extension().and_then(|ext| ext.to_str()) == Some(BACKUP_EXTENSION)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
