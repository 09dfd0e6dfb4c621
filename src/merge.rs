//! Context refresh: generated header, recorded proof body.
//!
//! A context file keeps everything from its first `intros` (or `#`) line on;
//! the lines before that come from the freshly generated script, up to the
//! script's own first `intros` line.
use crate::error::SessionError;
use crate::staging::replace_file;
use anyhow::Result;
use std::fs;
use std::path::Path;

const BODY_START: &str = "intros";
const MARKER_PREFIX: &str = "#";

/// Merge generated `script` text with recorded `context` text.
pub fn merge_context(context: &str, script: &str) -> String {
    let header = script
        .split_inclusive('\n')
        .take_while(|line| !line.starts_with(BODY_START));
    let body = context
        .split_inclusive('\n')
        .skip_while(|line| !(line.starts_with(BODY_START) || line.starts_with(MARKER_PREFIX)));
    header.chain(body).collect()
}

/// Replace the context file with its merge against the paired script.
///
/// Destructive: drift detection must have read the context file first.
pub fn merge_context_file(context_path: &Path, script_path: &Path) -> Result<()> {
    let script = fs::read_to_string(script_path)
        .map_err(|err| SessionError::from_io(script_path, err))?;
    let context = fs::read_to_string(context_path)
        .map_err(|err| SessionError::from_io(context_path, err))?;
    let merged = merge_context(&context, &script);
    replace_file(context_path, merged.as_bytes())?;
    tracing::debug!(
        context = %context_path.display(),
        script = %script_path.display(),
        "refreshed context header"
    );
    Ok(())
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
