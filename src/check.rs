//! Check identifiers and the manual-proof worklist.
use crate::error::SessionError;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// One verification check selected for targeted regeneration.
///
/// The `file:line` form pins a single verification condition; anything
/// without a colon names a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CheckIdentifier {
    Named(String),
    Line(String),
}

impl CheckIdentifier {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("check identifier must be non-empty"));
        }
        if trimmed.contains(':') {
            Ok(Self::Line(trimmed.to_string()))
        } else {
            Ok(Self::Named(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(value) | Self::Line(value) => value,
        }
    }

    pub fn is_line_scoped(&self) -> bool {
        matches!(self, Self::Line(_))
    }
}

impl FromStr for CheckIdentifier {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}

impl fmt::Display for CheckIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered list of checks that need forced regeneration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worklist {
    checks: Vec<CheckIdentifier>,
}

impl Worklist {
    pub fn single(check: CheckIdentifier) -> Self {
        Self {
            checks: vec![check],
        }
    }

    pub fn from_checks(checks: Vec<CheckIdentifier>) -> Self {
        Self { checks }
    }

    /// Parse worklist text: one identifier per line, blank lines skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let checks = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(CheckIdentifier::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { checks })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| SessionError::from_io(path, err))?;
        Self::parse(&text)
    }

    pub fn checks(&self) -> &[CheckIdentifier] {
        &self.checks
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

#[cfg(test)]
#[path = "check_tests.rs"]
mod tests;
