//! Run reporting.
//!
//! The engine never prints directly. It writes informational lines (one per
//! rename) and warnings to a [`Reporter`], and counts what it did in a
//! [`Summary`] that the binary prints at the end of a run.

use colored::Colorize;
use serde::Serialize;

/// Sink for the messages produced while a run is in progress.
pub trait Reporter {
    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
}

/// Writes labelled lines to stderr.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// Drop `info` lines, keep warnings.
    pub quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn info(&mut self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", "info:".blue().bold(), message);
        }
    }

    fn warn(&mut self, message: &str) {
        eprintln!("{} {}", "warn:".yellow().bold(), message);
    }
}

/// Keeps every line in memory. Used by tests and by callers embedding the
/// library that want to inspect the log after a run.
#[derive(Debug, Default)]
pub struct Recorder {
    pub infos: Vec<String>,
    pub warnings: Vec<String>,
}

impl Reporter for Recorder {
    fn info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

/// Counters from a completed run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub entries_visited: usize,
    pub directories_renamed: usize,
    pub files_renamed: usize,
    pub files_rewritten: usize,
    /// Files left alone because their bytes are not valid in the configured encoding.
    pub files_undecodable: usize,
}

impl Summary {
    pub fn changes(&self) -> usize {
        self.directories_renamed + self.files_renamed + self.files_rewritten
    }
}
