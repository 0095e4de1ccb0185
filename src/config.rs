//! Run configuration.
//!
//! [`Options`] holds the raw values gathered by the command line (or by any
//! other front end). [`Options::resolve`] turns them into a validated
//! [`RunConfig`]: the base directory is resolved, patterns are compiled, the
//! replacement is checked against the pattern, and the encoding label is
//! looked up. The engine only ever sees a `RunConfig`.

use crate::pattern::FindReplace;
use crate::report::Reporter;
use anyhow::{Context, Result, bail};
use encoding_rs::{Encoding, UTF_8};
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What a run rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    FileContents,
    Filenames,
    DirectoryNames,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::FileContents, Target::Filenames, Target::DirectoryNames];

    pub fn as_str(self) -> &'static str {
        match self {
            Target::FileContents => "file-contents",
            Target::Filenames => "filenames",
            Target::DirectoryNames => "directory-names",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid replacement type '{}', expected one of: file-contents, filenames, directory-names",
                    s
                )
            })
    }
}

/// The set of active targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Targets {
    pub file_contents: bool,
    pub filenames: bool,
    pub directory_names: bool,
}

impl Targets {
    pub fn contains(&self, target: Target) -> bool {
        match target {
            Target::FileContents => self.file_contents,
            Target::Filenames => self.filenames,
            Target::DirectoryNames => self.directory_names,
        }
    }

    pub fn insert(&mut self, target: Target) {
        match target {
            Target::FileContents => self.file_contents = true,
            Target::Filenames => self.filenames = true,
            Target::DirectoryNames => self.directory_names = true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.file_contents || self.filenames || self.directory_names)
    }

    pub fn iter(&self) -> impl Iterator<Item = Target> + '_ {
        Target::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

impl FromIterator<Target> for Targets {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        let mut targets = Targets::default();
        for target in iter {
            targets.insert(target);
        }
        targets
    }
}

/// Fully resolved settings for one run. Immutable once built.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Traversal root.
    pub root: PathBuf,
    pub recursive: bool,
    pub find_replace: FindReplace,
    /// Case-sensitive name suffixes; empty admits every file.
    pub file_masks: Vec<String>,
    /// Searched (not anchored) against bare entry names.
    pub exclusions: Vec<Regex>,
    pub targets: Targets,
    /// Charset for reading and writing file contents.
    pub encoding: &'static Encoding,
    /// Match per line (bounded memory) instead of over the whole file.
    pub line_based: bool,
}

impl RunConfig {
    /// A config with the defaults the command line uses: non-recursive,
    /// replace-all, line based, UTF-8, no masks or exclusions.
    pub fn new(root: impl Into<PathBuf>, find_replace: FindReplace, targets: Targets) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            find_replace,
            file_masks: Vec::new(),
            exclusions: Vec::new(),
            targets,
            encoding: UTF_8,
            line_based: true,
        }
    }
}

/// Unvalidated settings as a front end collects them.
#[derive(Debug, Clone)]
pub struct Options {
    /// Traversal root, relative to `project_dir` unless absolute.
    pub base_dir: PathBuf,
    /// Directory relative base dirs resolve against. Defaults to the current directory.
    pub project_dir: Option<PathBuf>,
    pub recursive: bool,
    pub find_regex: String,
    pub replace_value: String,
    pub targets: Vec<Target>,
    pub file_masks: Vec<String>,
    pub exclusions: Vec<String>,
    pub replace_all: bool,
    pub encoding: Option<String>,
    pub line_based: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            project_dir: None,
            recursive: false,
            find_regex: String::new(),
            replace_value: String::new(),
            targets: Vec::new(),
            file_masks: Vec::new(),
            exclusions: Vec::new(),
            replace_all: true,
            encoding: None,
            line_based: true,
        }
    }
}

impl Options {
    /// Validates and compiles everything the engine needs.
    ///
    /// Logs the resolved settings through `reporter`. An unknown encoding
    /// label falls back to UTF-8 with a warning; every other problem is an
    /// error.
    pub fn resolve(&self, reporter: &mut dyn Reporter) -> Result<RunConfig> {
        let targets: Targets = self.targets.iter().copied().collect();
        if targets.is_empty() {
            bail!("No replacement type given; use one or more of: file-contents, filenames, directory-names");
        }
        for target in targets.iter() {
            reporter.info(&format!("Mode set to {}", target));
        }

        let file_masks: Vec<String> = self
            .file_masks
            .iter()
            .filter(|m| !m.is_empty())
            .cloned()
            .collect();
        if !file_masks.is_empty() {
            reporter.info(&format!("fileMasks set to: {:?}", file_masks));
        }

        let mut exclusions = Vec::with_capacity(self.exclusions.len());
        for pattern in self.exclusions.iter().filter(|p| !p.is_empty()) {
            reporter.info(&format!("Compiling regex for exclusions: {}", pattern));
            let regex = Regex::new(pattern)
                .with_context(|| format!("Invalid exclusion pattern '{}'", pattern))?;
            exclusions.push(regex);
        }

        let multi_line = targets.file_contents && !self.line_based;
        let regex = RegexBuilder::new(&self.find_regex)
            .multi_line(multi_line)
            .build()
            .with_context(|| format!("Invalid find pattern '{}'", self.find_regex))?;
        let find_replace = FindReplace::new(regex, self.replace_value.clone(), self.replace_all)?;

        let root = self.resolve_root()?;
        reporter.info(&format!("baseDir set to: {}", root.display()));

        let encoding = resolve_encoding(self.encoding.as_deref(), reporter);

        Ok(RunConfig {
            root,
            recursive: self.recursive,
            find_replace,
            file_masks,
            exclusions,
            targets,
            encoding,
            line_based: self.line_based,
        })
    }

    fn resolve_root(&self) -> Result<PathBuf> {
        if self.base_dir.is_absolute() {
            return Ok(self.base_dir.clone());
        }
        let project = match &self.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        Ok(project.join(&self.base_dir))
    }
}

/// Looks up an encoding label (`ISO-8859-1`, `utf-8`, `windows-1252`, ...).
///
/// Missing or empty labels give UTF-8 silently; unknown labels give UTF-8
/// and a warning.
pub fn resolve_encoding(label: Option<&str>, reporter: &mut dyn Reporter) -> &'static Encoding {
    let Some(label) = label.filter(|l| !l.trim().is_empty()) else {
        return UTF_8;
    };
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(encoding) => {
            reporter.info(&format!("encoding set to: {}", encoding.name()));
            encoding
        }
        None => {
            reporter.warn(&format!(
                "Invalid encoding value {}. Using default charset.",
                label
            ));
            UTF_8
        }
    }
}
