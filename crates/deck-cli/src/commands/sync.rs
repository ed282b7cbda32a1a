//! Sync command implementation
//!
//! Runs a full mirror pass and prints the report.

use colored::Colorize;

use deck_core::{Category, ItemFailure, SyncOptions, SyncReport};

use super::open_engine;
use crate::cli::SourceArgs;
use crate::error::{CliError, Result};
use crate::progress::TerminalProgress;

/// Run the sync command
///
/// Item failures do not stop the pass; they are listed and turn the exit
/// status into an error once the report has been printed.
pub fn run_sync(args: &SourceArgs, dry_run: bool, json: bool) -> Result<()> {
    let engine = open_engine(args)?;

    if !json {
        println!(
            "{} Mirroring collection into {}...",
            "=>".blue().bold(),
            engine.config().destination.display().to_string().yellow()
        );
    }

    let progress = TerminalProgress::new(!json);
    let outcome = engine.sync(&SyncOptions { dry_run }, &progress);
    progress.finish();
    let report = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.success {
        return Err(CliError::user(format!(
            "Sync finished with {} failure(s)",
            report.failures.len()
        )));
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    if report.actions.is_empty() && report.failures.is_empty() {
        println!("{} Already in sync. No changes needed.", "OK".green().bold());
    } else {
        let heading = if report.dry_run {
            "Dry run complete:"
        } else {
            "Sync complete:"
        };
        let status = if report.success {
            "OK".green().bold()
        } else {
            "ERROR".red().bold()
        };
        println!("{status} {heading}");
        for action in &report.actions {
            println!("   {} {}", "+".green(), action);
        }

        println!();
        for category in [Category::Folder, Category::Note, Category::Asset, Category::Index] {
            let counts = report.counts(category);
            println!(
                "   {:<8} created {}, updated {}, moved {}, deleted {}, skipped {}, failed {}",
                category.to_string().cyan(),
                counts.created,
                counts.updated,
                counts.moved,
                counts.deleted,
                counts.skipped,
                counts.failed
            );
        }
    }

    if report.degraded > 0 {
        println!();
        println!(
            "{} {} note(s) written with fallback rendering",
            "DEGRADED".yellow().bold(),
            report.degraded
        );
    }

    if !report.warnings.is_empty() {
        println!();
        println!("{}", "Warnings:".yellow().bold());
        for warning in &report.warnings {
            println!("   {} {}", "!".yellow(), warning);
        }
    }

    if report.source_skipped > 0 {
        println!();
        println!(
            "{} {} note(s) not mirrored (run {} for details)",
            "SKIPPED".yellow().bold(),
            report.source_skipped,
            "deckmirror diff".cyan()
        );
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failures:".red().bold());
        for failure in &report.failures {
            println!("   {} {}", "!".red(), describe_failure(failure));
        }
    }

    println!();
    println!("Finished in {} ms.", report.elapsed_ms);
}

fn describe_failure(failure: &ItemFailure) -> String {
    let subject = match (&failure.path, failure.note_id) {
        (Some(path), _) => format!("{} {}", failure.category, path),
        (None, Some(id)) => format!("{} {id}", failure.category),
        (None, None) => failure.category.to_string(),
    };
    format!("{subject}: {}", failure.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn failure_lines_name_the_item() {
        let failure = ItemFailure {
            category: Category::Note,
            path: None,
            note_id: Some(7),
            message: "permission denied".into(),
        };
        assert_eq!(describe_failure(&failure), "note 7: permission denied");
    }
}
