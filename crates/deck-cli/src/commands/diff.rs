//! Diff command implementation
//!
//! Previews what sync would change without touching the vault.

use colored::Colorize;
use serde_json::json;

use deck_core::{ChangeKind, NoteConflict, PlannedChange, SkippedNote};

use super::open_engine;
use crate::cli::SourceArgs;
use crate::error::Result;
use crate::progress::TerminalProgress;

/// Run the diff command
///
/// Builds both states and prints the computed plan.
pub fn run_diff(args: &SourceArgs, json: bool) -> Result<()> {
    let engine = open_engine(args)?;
    let progress = TerminalProgress::new(!json);
    let planned = engine.plan(&progress);
    progress.finish();
    let (source, plan) = planned?;

    let assets_folder = &engine.config().assets_folder;
    let changes = plan.changes(assets_folder);

    if json {
        let json_output = json!({
            "has_changes": !plan.is_empty(),
            "summary": plan.summary(),
            "changes": changes,
            "skipped": source.skipped(),
            "blocked": plan.notes_blocked,
        });
        println!("{}", serde_json::to_string_pretty(&json_output)?);
    } else {
        print_diff_output(
            &engine.config().destination.display().to_string(),
            &changes,
            source.skipped(),
            &plan.notes_blocked,
        );
    }

    Ok(())
}

fn print_diff_output(
    destination: &str,
    changes: &[PlannedChange],
    skipped: &[SkippedNote],
    blocked: &[NoteConflict],
) {
    if changes.is_empty() {
        println!("{} No changes needed. Vault is in sync.", "OK".green().bold());
        print_skipped(skipped);
        print_blocked(blocked);
        return;
    }

    println!("{} {}", "Diff".blue().bold(), destination.yellow());
    println!();
    println!("{}", "Changes that would be made:".bold());
    println!();

    for change in changes {
        let line = match &change.detail {
            Some(detail) => format!("{} {} ({detail})", change.category, change.path),
            None => format!("{} {}", change.category, change.path),
        };
        match change.kind {
            ChangeKind::Add => println!("  {} {}", "+".green(), line.green()),
            ChangeKind::Modify => println!("  {} {}", "~".yellow(), line.yellow()),
            ChangeKind::Remove => println!("  {} {}", "-".red(), line.red()),
        }
    }

    print_skipped(skipped);
    print_blocked(blocked);

    println!();
    println!("Run {} to apply these changes.", "deckmirror sync".cyan());
}

fn print_skipped(skipped: &[SkippedNote]) {
    if skipped.is_empty() {
        return;
    }
    println!();
    println!(
        "{} {} note(s) not mirrored:",
        "SKIPPED".yellow().bold(),
        skipped.len()
    );
    for note in skipped {
        println!("   {} note {}: {}", "-".yellow(), note.id, note.reason);
    }
}

fn print_blocked(blocked: &[NoteConflict]) {
    if blocked.is_empty() {
        return;
    }
    println!();
    println!(
        "{} {} note(s) held back by files the mirror does not manage:",
        "BLOCKED".yellow().bold(),
        blocked.len()
    );
    for conflict in blocked {
        println!("   {} note {}: {}", "!".yellow(), conflict.note_id, conflict.path);
    }
}
