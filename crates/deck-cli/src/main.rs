//! deck-mirror CLI
//!
//! Mirrors a flashcard collection export into a markdown vault.

mod cli;
mod commands;
mod error;
mod logging;
mod progress;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to initialise logging: {e}", "warning".yellow().bold());
    }
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(Commands::Sync { dry_run, json }) => commands::run_sync(&cli.sources, dry_run, json),
        Some(Commands::Diff { json }) => commands::run_diff(&cli.sources, json),
        None => {
            println!("{} deck-mirror CLI", "deckmirror".green().bold());
            println!();
            println!("Run {} for available commands.", "deckmirror --help".cyan());
            Ok(())
        }
    }
}
