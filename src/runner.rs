//! Execution of external tools.
//!
//! The orchestrator only talks to `ToolRunner`, so tests can substitute a
//! recorder that simulates the prover and the build system.
use crate::command::ToolInvocation;
use crate::config::ToolEnvironment;
use crate::error::SessionError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::Instant;

pub trait ToolRunner {
    /// Run `invocation` to completion; a non-zero exit is an error.
    fn run(&mut self, invocation: &ToolInvocation, env: &ToolEnvironment) -> Result<()>;
}

/// Runs tools as child processes in the project root, inheriting stdio so
/// prover output streams to the terminal.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cwd: PathBuf,
}

impl ProcessRunner {
    pub fn new(cwd: PathBuf) -> Self {
        Self { cwd }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&mut self, invocation: &ToolInvocation, env: &ToolEnvironment) -> Result<()> {
        let command_line = invocation.command_line();
        tracing::info!(command = %command_line, "run");
        let start = Instant::now();
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(env.vars())
            .current_dir(&self.cwd)
            .status()
            .with_context(|| format!("spawn {}", invocation.program))?;
        let elapsed_ms = start.elapsed().as_millis();
        tracing::info!(
            elapsed_ms,
            success = status.success(),
            command = %command_line,
            "command complete"
        );
        if !status.success() {
            return Err(SessionError::ToolFailed {
                command: command_line,
                status: exit_status_string(&status),
            }
            .into());
        }
        Ok(())
    }
}

/// Resolve every program on `PATH` (or as a path) before touching anything.
pub fn preflight(programs: &[&str], cwd: &Path) -> Result<()> {
    for program in programs {
        let resolved = which::which_in(program, std::env::var_os("PATH"), cwd).map_err(|_| {
            SessionError::ToolUnavailable {
                program: program.to_string(),
            }
        })?;
        tracing::debug!(program = %program, resolved = %resolved.display(), "tool available");
    }
    Ok(())
}

pub fn exit_status_string(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}
