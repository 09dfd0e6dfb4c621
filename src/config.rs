//! Session configuration and the project layout derived from it.
//!
//! The config file is optional; every field has a default that matches the
//! library's conventional layout.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "session.json";
pub const BODY_MODE_ENV: &str = "SPARKLIB_BODY_MODE";
pub const INSTALLED_ENV: &str = "SPARKLIB_INSTALLED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub project_name: String,
    pub with_projects: Vec<String>,
    pub source_dir: String,
    pub staging_source_dir: String,
    pub object_dir: String,
    pub proof_dir: String,
    pub report_dir: String,
    pub worklist: String,
    pub prover_program: String,
    pub build_program: String,
    pub smoke_prover: String,
    pub smoke_level: u8,
    pub sweep_provers: Vec<String>,
    pub sweep_timeout_secs: u32,
    pub summary_options: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            project_name: "sparklib_gen".to_string(),
            with_projects: vec!["sparklib_common".to_string()],
            source_dir: "src".to_string(),
            staging_source_dir: "src2".to_string(),
            object_dir: "obj2".to_string(),
            proof_dir: "proof".to_string(),
            report_dir: "temp".to_string(),
            worklist: "manual_proof.in".to_string(),
            prover_program: "gnatprove".to_string(),
            build_program: "make".to_string(),
            smoke_prover: "cvc5".to_string(),
            smoke_level: 1,
            sweep_provers: ["cvc5", "z3", "alt-ergo", "colibri"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            sweep_timeout_secs: 100,
            summary_options: "--output-msg-only --report=provers".to_string(),
        }
    }
}

/// Flags the external tools read from their environment.
///
/// Passed explicitly to every child process; the orchestrator never edits
/// its own environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ToolEnvironment {
    pub body_mode_enabled: bool,
    pub treat_library_as_installed: bool,
}

impl ToolEnvironment {
    /// Seed from the given variable lookup (normally `std::env::var`).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            body_mode_enabled: lookup(BODY_MODE_ENV).is_some_and(|value| is_truthy(&value)),
            treat_library_as_installed: lookup(INSTALLED_ENV)
                .is_some_and(|value| is_truthy(&value)),
        }
    }

    pub fn vars(&self) -> [(&'static str, &'static str); 2] {
        [
            (
                BODY_MODE_ENV,
                if self.body_mode_enabled { "On" } else { "Off" },
            ),
            (
                INSTALLED_ENV,
                if self.treat_library_as_installed {
                    "True"
                } else {
                    "False"
                },
            ),
        ]
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

/// Load a config file, or defaults when `explicit` is absent and no
/// `session.json` sits in the project root.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<SessionConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = root.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                return Ok(SessionConfig::default());
            }
            candidate
        }
    };
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: SessionConfig =
        serde_json::from_slice(&bytes).context("parse session config JSON")?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &SessionConfig) -> Result<()> {
    let names = [
        ("project_name", &config.project_name),
        ("prover_program", &config.prover_program),
        ("build_program", &config.build_program),
        ("smoke_prover", &config.smoke_prover),
    ];
    for (label, value) in names {
        if value.trim().is_empty() {
            return Err(anyhow!("{label} must be non-empty"));
        }
    }
    if config.sweep_provers.is_empty() {
        return Err(anyhow!("sweep_provers must name at least one prover"));
    }
    let dirs = [
        ("source_dir", &config.source_dir),
        ("staging_source_dir", &config.staging_source_dir),
        ("object_dir", &config.object_dir),
        ("proof_dir", &config.proof_dir),
        ("report_dir", &config.report_dir),
        ("worklist", &config.worklist),
    ];
    for (label, rel) in dirs {
        validate_relative_path(rel, label)?;
    }
    if config.source_dir == config.staging_source_dir {
        return Err(anyhow!(
            "staging_source_dir must differ from source_dir (got {:?})",
            config.source_dir
        ));
    }
    Ok(())
}

fn validate_relative_path(rel: &str, label: &str) -> Result<()> {
    let path = Path::new(rel);
    if rel.trim().is_empty() || path.is_absolute() || has_parent_components(path) {
        return Err(anyhow!(
            "{label} must be a relative path without '..' (got {rel:?})"
        ));
    }
    Ok(())
}

fn has_parent_components(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, std::path::Component::ParentDir))
}

/// Typed paths into a project checkout.
#[derive(Debug, Clone)]
pub struct SessionLayout {
    root: PathBuf,
    config: SessionConfig,
}

impl SessionLayout {
    pub fn new(root: PathBuf, config: SessionConfig) -> Self {
        Self { root, config }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// File name of the generated project descriptor, relative to the root.
    pub fn project_file_name(&self) -> String {
        format!("{}.gpr", self.config.project_name)
    }

    pub fn project_file(&self) -> PathBuf {
        self.root.join(self.project_file_name())
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.config.source_dir)
    }

    pub fn staging_source_dir(&self) -> PathBuf {
        self.root.join(&self.config.staging_source_dir)
    }

    pub fn proof_dir(&self) -> PathBuf {
        self.root.join(&self.config.proof_dir)
    }

    /// Return the `proof/sessions` directory path.
    pub fn sessions_dir(&self) -> PathBuf {
        self.proof_dir().join("sessions")
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root.join(&self.config.report_dir)
    }

    pub fn worklist_path(&self) -> PathBuf {
        self.root.join(&self.config.worklist)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
