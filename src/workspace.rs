//! Disposable project workspace: generated descriptor plus a body-mode copy
//! of the sources.
//!
//! The canonical source tree is never rewritten. Both generated artifacts are
//! removed when the guard drops unless the caller asked to keep them.
use crate::config::SessionLayout;
use crate::error::SessionError;
use crate::staging::{copy_tree, remove_dir_if_exists};
use crate::transform::SourceTransformer;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const ADA_SWITCHES: &[&str] = &["-gnat2022", "-gnatygo-u", "-gnata", "-gnatwI"];

/// Render the project descriptor the prover is pointed at.
pub fn render_project_file(layout: &SessionLayout) -> String {
    let config = layout.config();
    let mut text = String::from("\n");
    for with in &config.with_projects {
        text.push_str(&format!("with \"{with}\";\n"));
    }
    let staging = &config.staging_source_dir;
    let switches = ADA_SWITCHES
        .iter()
        .map(|switch| format!("\"{switch}\""))
        .collect::<Vec<_>>()
        .join(", ");
    text.push_str(&format!("project {} is\n", config.project_name));
    text.push_str(&format!(
        "   for Source_Dirs use (\"{staging}\", \"{staging}/full\");\n"
    ));
    text.push_str(&format!("   for Object_Dir use \"{}\";\n", config.object_dir));
    text.push_str("   package Compiler is\n");
    text.push_str(&format!(
        "      for Default_Switches (\"Ada\") use ({switches});\n"
    ));
    text.push_str("   end Compiler;\n");
    text.push_str("   package Prove is\n");
    text.push_str(&format!("     for Proof_Dir use \"{}\";\n", config.proof_dir));
    text.push_str("   end Prove;\n");
    text.push_str(&format!("end {};\n", config.project_name));
    text
}

#[derive(Debug)]
pub struct ProjectWorkspace {
    project_file: PathBuf,
    staging_dir: PathBuf,
    keep: bool,
}

impl ProjectWorkspace {
    /// Write the descriptor, copy the sources and enable body mode in the copy.
    pub fn prepare(layout: &SessionLayout, keep: bool) -> Result<Self> {
        let staging_dir = layout.staging_source_dir();
        if staging_dir.exists() {
            return Err(SessionError::WorkspaceOccupied { path: staging_dir }.into());
        }
        let source_dir = layout.source_dir();
        if !source_dir.is_dir() {
            return Err(SessionError::MissingFile { path: source_dir }.into());
        }

        let project_file = layout.project_file();
        fs::write(&project_file, render_project_file(layout))
            .with_context(|| format!("write {}", project_file.display()))?;
        // From here on the guard owns cleanup, including on early return.
        let workspace = Self {
            project_file,
            staging_dir,
            keep,
        };

        let copied = copy_tree(&source_dir, &workspace.staging_dir)?;
        tracing::info!(
            from = %source_dir.display(),
            to = %workspace.staging_dir.display(),
            files = copied,
            "copied source tree"
        );
        SourceTransformer::new()?.rewrite_tree(&workspace.staging_dir)?;
        Ok(workspace)
    }

    pub fn project_file(&self) -> &std::path::Path {
        &self.project_file
    }

    pub fn staging_dir(&self) -> &std::path::Path {
        &self.staging_dir
    }
}

impl Drop for ProjectWorkspace {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!(
                project = %self.project_file.display(),
                sources = %self.staging_dir.display(),
                "keeping generated workspace"
            );
            return;
        }
        if self.project_file.is_file() {
            if let Err(err) = fs::remove_file(&self.project_file) {
                tracing::warn!(
                    path = %self.project_file.display(),
                    %err,
                    "failed to remove project file"
                );
            }
        }
        if let Err(err) = remove_dir_if_exists(&self.staging_dir) {
            tracing::warn!(
                path = %self.staging_dir.display(),
                err = %format!("{err:#}"),
                "failed to remove source copy"
            );
        }
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
