//! Renaming files and directories.
//!
//! Only the bare name is matched, never the parent path. The move is a plain
//! `fs::rename` inside the same parent, so it is atomic or it fails.

use crate::pattern::FindReplace;
use crate::report::Reporter;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Computes the replacement for a bare name, or `None` if it does not change.
pub fn new_name(find_replace: &FindReplace, name: &str) -> Option<String> {
    let renamed = find_replace.apply(name);
    if renamed == name {
        None
    } else {
        Some(renamed.into_owned())
    }
}

/// Renames `path` in place and returns where the entry now lives.
///
/// Returns `path` unchanged if the name does not change or is not valid
/// UTF-8. Refuses to move onto an existing entry.
pub fn rename(
    path: &Path,
    find_replace: &FindReplace,
    reporter: &mut dyn Reporter,
) -> Result<PathBuf> {
    let Some(file_name) = path.file_name() else {
        return Ok(path.to_path_buf());
    };
    let Some(old_name) = file_name.to_str() else {
        reporter.warn(&format!(
            "Not renaming {}: name is not valid UTF-8",
            path.display()
        ));
        return Ok(path.to_path_buf());
    };
    let Some(new_name) = new_name(find_replace, old_name) else {
        return Ok(path.to_path_buf());
    };

    if new_name.is_empty() || new_name.contains(std::path::is_separator) {
        bail!(
            "Cannot rename {} to '{}': not a valid file name",
            path.display(),
            new_name
        );
    }

    let target = path.with_file_name(&new_name);
    if target.symlink_metadata().is_ok() {
        bail!(
            "Cannot rename {} to {}: target already exists",
            path.display(),
            target.display()
        );
    }

    reporter.info(&format!("Renaming {} to {}", old_name, new_name));

    std::fs::rename(path, &target).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            path.display(),
            target.display()
        )
    })?;

    Ok(target)
}
