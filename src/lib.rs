//! far: regex find-and-replace over a directory tree.
//!
//! Rewrites any combination of file contents, file names and directory names
//! under a root directory. The work happens in three parts:
//!
//! 1. **Configuration**: [`config::Options`] is resolved into a validated
//!    [`RunConfig`] (patterns compiled, replacement checked, encoding looked up)
//! 2. **Traversal**: [`walker`] walks the tree depth-first, applying the
//!    exclusion and file-mask filters, and descends into directories under
//!    their new names after renaming them
//! 3. **Mutation**: [`renamer`] renames entries in place and [`rewriter`]
//!    rewrites contents through a temporary file swapped over the original
//!
//! # Example
//!
//! ```no_run
//! use far::config::{Options, Target};
//! use far::report::ConsoleReporter;
//! use std::path::PathBuf;
//!
//! let options = Options {
//!     base_dir: PathBuf::from("src/main/resources"),
//!     recursive: true,
//!     find_regex: "-".to_string(),
//!     replace_value: "_".to_string(),
//!     targets: vec![Target::DirectoryNames, Target::FileContents],
//!     file_masks: vec![".xml".to_string()],
//!     ..Options::default()
//! };
//!
//! let mut reporter = ConsoleReporter::default();
//! let config = options.resolve(&mut reporter).unwrap();
//! let summary = far::walker::run(&config, &mut reporter).unwrap();
//!
//! println!("{} files rewritten", summary.files_rewritten);
//! ```

pub mod config;
pub mod pattern;
pub mod renamer;
pub mod report;
pub mod rewriter;
pub mod scanner;
pub mod walker;

// Re-export commonly used types at crate root
pub use config::{Options, RunConfig, Target, Targets};
pub use pattern::FindReplace;
pub use report::{Reporter, Summary};
pub use walker::run;
