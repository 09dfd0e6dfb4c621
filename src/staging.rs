//! Filesystem primitives shared by the rewrite passes.
//!
//! Every rewrite goes through `replace_file`: the new bytes land in a temp
//! file beside the target and are renamed over it only once fully written.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if file_type.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Atomically replace `dest` with `bytes`.
pub fn replace_file(dest: &Path, bytes: &[u8]) -> Result<()> {
    let parent = dest
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".proof-session-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write temp file for {}", dest.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("flush temp file for {}", dest.display()))?;
    tmp.persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("replace {}", dest.display()))?;
    Ok(())
}

/// Copy `source` to `dest` recursively. `dest` must not exist yet.
pub fn copy_tree(source: &Path, dest: &Path) -> Result<usize> {
    if !source.is_dir() {
        return Err(anyhow!("source tree {} is not a directory", source.display()));
    }
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;
    let mut copied = 0;
    for entry in fs::read_dir(source).with_context(|| format!("read {}", source.display()))? {
        let entry = entry?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copied += copy_tree(&from, &to)?;
        } else if file_type.is_file() {
            fs::copy(&from, &to)
                .with_context(|| format!("copy {} to {}", from.display(), to.display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Remove a directory tree if present. Returns whether anything was removed.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    fs::remove_dir_all(path).with_context(|| format!("remove {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
