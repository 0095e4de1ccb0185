//! far: regex find-and-replace over a directory tree.
//!
//! Rewrites file contents, file names and directory names under a base
//! directory. Intended to run as one step of a build.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Commands, ReplaceArgs};
use colored::Colorize;
use far::report::{ConsoleReporter, Reporter, Summary};
use far::scanner::{self, Change, Plan};
use far::walker;

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Run {
            replace,
            json,
            quiet,
        } => cmd_run(replace, json, quiet),
        Commands::Scan { replace, json } => cmd_scan(replace, json),
    }
}

fn cmd_run(args: ReplaceArgs, json_output: bool, quiet: bool) -> Result<()> {
    let mut reporter = ConsoleReporter::new(quiet);
    if args.skip {
        reporter.warn("Skipping execution.");
        return Ok(());
    }

    let config = args.into_options().resolve(&mut reporter)?;
    let summary = walker::run(&config, &mut reporter).context("Unable to process files")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn cmd_scan(args: ReplaceArgs, json_output: bool) -> Result<()> {
    let mut reporter = ConsoleReporter::new(true);
    if args.skip {
        reporter.warn("Skipping execution.");
        return Ok(());
    }

    let config = args.into_options().resolve(&mut reporter)?;
    let plan = scanner::plan(&config).context("Unable to scan files")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan, config.encoding.name());
    }

    Ok(())
}

fn print_summary(summary: &Summary) {
    if summary.changes() == 0 {
        println!(
            "{} No changes made ({} entries visited)",
            "ok:".green().bold(),
            summary.entries_visited
        );
    } else {
        println!(
            "{} {} directories renamed, {} files renamed, {} files rewritten ({} entries visited)",
            "done:".green().bold(),
            summary.directories_renamed,
            summary.files_renamed,
            summary.files_rewritten,
            summary.entries_visited
        );
    }

    if summary.files_undecodable > 0 {
        println!(
            "{} {} file(s) skipped: contents not valid in the configured encoding",
            "warn:".yellow().bold(),
            summary.files_undecodable
        );
    }
}

fn print_plan(plan: &Plan, encoding: &str) {
    if plan.changes.is_empty() {
        println!(
            "{} Nothing to change ({} entries visited)",
            "ok:".green().bold(),
            plan.entries_visited
        );
        return;
    }

    println!(
        "Would apply {} change(s) across {} entries:\n",
        plan.changes.len(),
        plan.entries_visited
    );

    for change in &plan.changes {
        let path = change.path().display().to_string();
        match change {
            Change::DirectoryName { new_name, .. } => {
                println!("  {} {} {}", format!("{}/", path).dimmed(), "->".green(), new_name.green());
            }
            Change::FileName { new_name, .. } => {
                println!("  {} {} {}", path.dimmed(), "->".green(), new_name.green());
            }
            Change::FileContents { replacements, .. } => {
                println!(
                    "  {} {}",
                    path,
                    format!("({} replacement(s))", replacements).yellow()
                );
            }
            Change::Undecodable { .. } => {
                println!(
                    "  {} {}",
                    path.dimmed(),
                    format!("(skipped: not valid {})", encoding).red()
                );
            }
        }
    }
}
