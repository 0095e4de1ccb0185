//! Dry runs.
//!
//! Drives the same walker as a real run with a visitor that only records
//! what would change. Nothing is renamed, so directories are descended under
//! their current names and the listing shows current paths alongside the
//! predicted new names.

use crate::config::RunConfig;
use crate::renamer;
use crate::rewriter;
use crate::walker::{self, Visitor};
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One change a run would make. Paths are relative to the run root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Change {
    DirectoryName { path: PathBuf, new_name: String },
    FileName { path: PathBuf, new_name: String },
    FileContents { path: PathBuf, replacements: usize },
    /// Contents would be skipped: not valid in the configured encoding.
    Undecodable { path: PathBuf },
}

impl Change {
    pub fn path(&self) -> &Path {
        match self {
            Change::DirectoryName { path, .. }
            | Change::FileName { path, .. }
            | Change::FileContents { path, .. }
            | Change::Undecodable { path } => path,
        }
    }
}

/// Result of a dry run.
#[derive(Debug, Default, Serialize)]
pub struct Plan {
    pub entries_visited: usize,
    pub changes: Vec<Change>,
}

/// Lists the changes `walker::run` would make with `config`, in walk order.
pub fn plan(config: &RunConfig) -> Result<Plan> {
    let mut planner = Planner {
        config,
        changes: Vec::new(),
    };
    let entries_visited = walker::walk(config, &mut planner)?;
    Ok(Plan {
        entries_visited,
        changes: planner.changes,
    })
}

struct Planner<'a> {
    config: &'a RunConfig,
    changes: Vec<Change>,
}

impl Planner<'_> {
    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.config.root)
            .unwrap_or(path)
            .to_path_buf()
    }

    fn predicted_name(&self, path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        renamer::new_name(&self.config.find_replace, name)
    }
}

impl Visitor for Planner<'_> {
    fn directory_name(&mut self, dir: &Path) -> Result<PathBuf> {
        if let Some(new_name) = self.predicted_name(dir) {
            self.changes.push(Change::DirectoryName {
                path: self.relative(dir),
                new_name,
            });
        }
        Ok(dir.to_path_buf())
    }

    fn file_contents(&mut self, file: &Path) -> Result<()> {
        match rewriter::planned_replacements(file, self.config)? {
            Some(0) => {}
            Some(replacements) => self.changes.push(Change::FileContents {
                path: self.relative(file),
                replacements,
            }),
            None => self.changes.push(Change::Undecodable {
                path: self.relative(file),
            }),
        }
        Ok(())
    }

    fn file_name(&mut self, file: &Path) -> Result<PathBuf> {
        if let Some(new_name) = self.predicted_name(file) {
            self.changes.push(Change::FileName {
                path: self.relative(file),
                new_name,
            });
        }
        Ok(file.to_path_buf())
    }
}
