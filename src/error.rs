//! Fatal error classes for a session run.
//!
//! Everything else travels as `anyhow::Error` with context; these variants
//! exist so callers can tell a missing artifact from a failed prover run.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("required file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("external command failed with {status}: {command}")]
    ToolFailed { command: String, status: String },

    #[error("external program `{program}` is not available on PATH")]
    ToolUnavailable { program: String },

    #[error("failed to rewrite {}", path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workspace directory already exists: {}", path.display())]
    WorkspaceOccupied { path: PathBuf },
}

impl SessionError {
    /// Map an I/O failure on `path` to `MissingFile` when the file is absent.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> anyhow::Error {
        if err.kind() == std::io::ErrorKind::NotFound {
            SessionError::MissingFile {
                path: path.to_path_buf(),
            }
            .into()
        } else {
            anyhow::Error::new(err).context(format!("read {}", path.display()))
        }
    }
}
