//! Command-line interface definitions.
//!
//! Defines the argument parser and subcommands using clap's derive API.
//! `run` applies the find-and-replace; `scan` lists what `run` would change.
//! Every option can also come from a `FAR_*` environment variable.

use clap::{ArgAction, Parser, Subcommand};
use far::config::{Options, Target};
use std::path::PathBuf;

/// Regex find-and-replace across file contents, file names and directory names.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply the find-and-replace to the directory tree.
    Run {
        #[command(flatten)]
        replace: ReplaceArgs,

        /// Print the run summary as JSON on stdout.
        #[arg(long)]
        json: bool,

        /// Only print warnings and the final summary.
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the changes `run` would make without touching any file.
    Scan {
        #[command(flatten)]
        replace: ReplaceArgs,

        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, clap::Args)]
pub struct ReplaceArgs {
    /// Directory to start from. Relative paths resolve against the current directory.
    #[arg(short = 'd', long, env = "FAR_BASE_DIR", default_value = ".")]
    pub base_dir: PathBuf,

    /// Descend into subdirectories.
    #[arg(short, long, env = "FAR_RECURSIVE")]
    pub recursive: bool,

    /// Regular expression to find.
    #[arg(
        short,
        long,
        env = "FAR_FIND",
        required_unless_present = "skip",
        allow_hyphen_values = true
    )]
    pub find: Option<String>,

    /// Replacement text. `$1` and `${name}` insert capture groups; `$$` is a literal `$`.
    #[arg(
        short = 'R',
        long,
        env = "FAR_REPLACE",
        default_value = "",
        allow_hyphen_values = true
    )]
    pub replace: String,

    /// What to rewrite, comma separated: file-contents, filenames, directory-names.
    #[arg(
        short = 't',
        long = "type",
        env = "FAR_TYPE",
        value_delimiter = ',',
        value_parser = parse_target,
        required_unless_present = "skip"
    )]
    pub types: Vec<Target>,

    /// Only process files whose names end with one of these suffixes (e.g. ".xml,.yml").
    /// Directories are never filtered by mask.
    #[arg(short = 'm', long, env = "FAR_FILE_MASK", value_delimiter = ',')]
    pub file_mask: Vec<String>,

    /// Skip entries whose name contains a match for this regex. May be repeated.
    #[arg(short, long, env = "FAR_EXCLUDE", allow_hyphen_values = true)]
    pub exclude: Vec<String>,

    /// Replace every match (`true`) or only the first one (`false`).
    #[arg(long, env = "FAR_REPLACE_ALL", default_value_t = true, action = ArgAction::Set)]
    pub replace_all: bool,

    /// Character encoding of file contents (e.g. "ISO-8859-1"). Unknown labels fall back to UTF-8.
    #[arg(long, env = "FAR_ENCODING")]
    pub encoding: Option<String>,

    /// Match contents line by line (`true`) or as one document (`false`, needed for
    /// patterns spanning lines; enables multi-line `^`/`$`).
    #[arg(long, env = "FAR_LINE_BASED", default_value_t = true, action = ArgAction::Set)]
    pub line_based: bool,

    /// Do nothing and exit successfully.
    #[arg(long, env = "FAR_SKIP")]
    pub skip: bool,
}

impl ReplaceArgs {
    pub fn into_options(self) -> Options {
        Options {
            base_dir: self.base_dir,
            project_dir: None,
            recursive: self.recursive,
            find_regex: self.find.unwrap_or_default(),
            replace_value: self.replace,
            targets: self.types,
            file_masks: self.file_mask,
            exclusions: self.exclude,
            replace_all: self.replace_all,
            encoding: self.encoding,
            line_based: self.line_based,
        }
    }
}

fn parse_target(s: &str) -> Result<Target, String> {
    s.trim().parse()
}
