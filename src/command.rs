//! Command lines for the prover and the build system.
//!
//! Nothing here executes anything; `runner` does that.
use crate::check::CheckIdentifier;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;

pub const MANUAL_PROVER: &str = "coq";
pub const DEFAULT_LEVEL: u8 = 4;

/// A program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Space-joined line for logs; words with blanks are shell-quoted.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| {
                if word.is_empty() || word.contains(char::is_whitespace) {
                    shell_words::quote(word).into_owned()
                } else {
                    word.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|arg| arg == needle)
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Build-system targets used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Clean,
    Generate,
}

impl BuildTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Generate => "generate",
        }
    }
}

/// Prover command construction for one project descriptor.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    prover_program: String,
    build_program: String,
    project_file: String,
}

impl CommandBuilder {
    pub fn new(
        prover_program: impl Into<String>,
        build_program: impl Into<String>,
        project_file: impl Into<String>,
    ) -> Self {
        Self {
            prover_program: prover_program.into(),
            build_program: build_program.into(),
            project_file: project_file.into(),
        }
    }

    fn base(&self) -> ToolInvocation {
        ToolInvocation::new(&self.prover_program)
            .arg("-P")
            .arg(&self.project_file)
            .arg("-j0")
            .arg("--output=oneline")
    }

    /// Regenerate the artifacts of a single check with the manual prover.
    pub fn targeted(&self, check: &CheckIdentifier) -> ToolInvocation {
        let limit = if check.is_line_scoped() {
            format!("--limit-line={}", check.as_str())
        } else {
            format!("--limit-name={}", check.as_str())
        };
        self.base()
            .arg("-U")
            .arg(format!("--prover={MANUAL_PROVER}"))
            .arg("--report=provers")
            .arg(limit)
    }

    /// Batch proving with the given provers; counterexamples always off.
    pub fn automatic<S: AsRef<str>>(
        &self,
        provers: &[S],
        level: Option<u8>,
        timeout_secs: Option<u32>,
    ) -> ToolInvocation {
        let provers = provers
            .iter()
            .map(|prover| prover.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        let mut invocation = self
            .base()
            .arg("--counterexamples=off")
            .arg(format!("--prover={provers}"))
            .arg(format!("--level={}", level.unwrap_or(DEFAULT_LEVEL)));
        if let Some(timeout) = timeout_secs {
            invocation = invocation.arg(format!("--timeout={timeout}"));
        }
        invocation
    }

    /// Pass `options` through verbatim after the shared base.
    pub fn raw_options(&self, options: &str) -> Result<ToolInvocation> {
        let words = shell_words::split(options)
            .with_context(|| format!("parse prover options: {options}"))?;
        Ok(words
            .into_iter()
            .fold(self.base().arg("--counterexamples=off"), |invocation, word| {
                invocation.arg(word)
            }))
    }

    pub fn build(&self, target: BuildTarget) -> ToolInvocation {
        ToolInvocation::new(&self.build_program).arg(target.as_str())
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
