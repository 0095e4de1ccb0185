//! Tree traversal.
//!
//! The walk is depth-first and pre-order over a work queue the loop owns.
//! The queue starts with the sorted children of the root. Each entry is
//! popped from the front and handled once:
//!
//! - A directory is renamed first (when directory names are a target and its
//!   current name is not excluded). When recursing, the children of the
//!   *renamed* path are pushed to the front of the queue, ahead of siblings
//!   that were queued earlier.
//! - A regular file that passes the exclusion and mask filters has its
//!   contents rewritten, then its name.
//!
//! Symbolic links are skipped. Any failure to list a directory or to mutate
//! an entry ends the walk; earlier changes stay in place.

use crate::config::RunConfig;
use crate::renamer;
use crate::report::{Reporter, Summary};
use crate::rewriter::{self, Outcome};
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// The actions applied to entries that pass the filters.
///
/// The walker decides *whether* to act; a visitor decides *what* acting
/// means. The directory and file-name hooks return the path the entry now
/// lives at.
pub trait Visitor {
    fn directory_name(&mut self, dir: &Path) -> Result<PathBuf>;
    fn file_contents(&mut self, file: &Path) -> Result<()>;
    fn file_name(&mut self, file: &Path) -> Result<PathBuf>;
}

/// Applies `config` to the tree under `config.root`.
pub fn run(config: &RunConfig, reporter: &mut dyn Reporter) -> Result<Summary> {
    let mut apply = Apply {
        config,
        reporter,
        summary: Summary::default(),
    };
    let visited = walk(config, &mut apply)?;
    let mut summary = apply.summary;
    summary.entries_visited = visited;
    Ok(summary)
}

/// Walks the tree under `config.root`, calling `visitor` for every entry
/// that passes the filters. Returns the number of entries visited.
pub fn walk<V: Visitor + ?Sized>(config: &RunConfig, visitor: &mut V) -> Result<usize> {
    let mut queue: VecDeque<PathBuf> = list_children(&config.root)?.into();
    let mut visited = 0;

    while let Some(entry) = queue.pop_front() {
        visited += 1;
        let file_type = entry
            .symlink_metadata()
            .with_context(|| format!("Failed to read metadata of {}", entry.display()))?
            .file_type();

        if file_type.is_dir() {
            let mut dir = entry;
            if config.targets.directory_names && !is_excluded(config, &dir) {
                dir = visitor.directory_name(&dir)?;
            }
            if config.recursive {
                for child in list_children(&dir)?.into_iter().rev() {
                    queue.push_front(child);
                }
            }
        } else if file_type.is_file() {
            if is_excluded(config, &entry) || !matches_mask(config, &entry) {
                continue;
            }
            if config.targets.file_contents {
                visitor.file_contents(&entry)?;
            }
            if config.targets.filenames {
                visitor.file_name(&entry)?;
            }
        }
    }

    Ok(visited)
}

/// Whether any exclusion pattern occurs anywhere in the entry's bare name.
pub fn is_excluded(config: &RunConfig, path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy();
    config.exclusions.iter().any(|re| re.is_match(&name))
}

/// Whether the bare name ends with one of the configured masks. No masks
/// admits everything.
pub fn matches_mask(config: &RunConfig, path: &Path) -> bool {
    if config.file_masks.is_empty() {
        return true;
    }
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.as_encoded_bytes();
    config
        .file_masks
        .iter()
        .any(|mask| name.ends_with(mask.as_bytes()))
}

/// Immediate children of `dir`, sorted by name.
fn list_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Unable to list entries in {}", dir.display()))?;
    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Unable to list entries in {}", dir.display()))?;
        children.push(entry.path());
    }
    children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(children)
}

/// The mutating visitor behind [`run`].
struct Apply<'a> {
    config: &'a RunConfig,
    reporter: &'a mut dyn Reporter,
    summary: Summary,
}

impl Visitor for Apply<'_> {
    fn directory_name(&mut self, dir: &Path) -> Result<PathBuf> {
        let renamed = renamer::rename(dir, &self.config.find_replace, &mut *self.reporter)?;
        if renamed != dir {
            self.summary.directories_renamed += 1;
        }
        Ok(renamed)
    }

    fn file_contents(&mut self, file: &Path) -> Result<()> {
        match rewriter::rewrite(file, self.config)? {
            Outcome::Rewritten => self.summary.files_rewritten += 1,
            Outcome::Unchanged => {}
            Outcome::Undecodable => {
                self.summary.files_undecodable += 1;
                self.reporter.warn(&format!(
                    "Skipping contents of {}: not valid {}",
                    file.display(),
                    self.config.encoding.name()
                ));
            }
        }
        Ok(())
    }

    fn file_name(&mut self, file: &Path) -> Result<PathBuf> {
        let renamed = renamer::rename(file, &self.config.find_replace, &mut *self.reporter)?;
        if renamed != file {
            self.summary.files_renamed += 1;
        }
        Ok(renamed)
    }
}
