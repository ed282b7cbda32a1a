//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// deck-mirror - Mirror a flashcard collection into a markdown vault
#[derive(Parser, Debug)]
#[command(name = "deckmirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings shared by every command. Each one overrides the config files.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceArgs {
    /// Config file (TOML, JSON or YAML) layered over the global config
    #[arg(long, global = true, env = "DECKMIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Collection export to read
    #[arg(long, global = true, env = "DECKMIRROR_COLLECTION")]
    pub collection: Option<PathBuf>,

    /// Root of the markdown vault to write
    #[arg(long = "dest", global = true, env = "DECKMIRROR_DEST")]
    pub destination: Option<PathBuf>,

    /// Media folder of the collection [default: collection.media next to the export]
    #[arg(long = "media", global = true)]
    pub media_dir: Option<PathBuf>,

    /// Folder under the vault root that receives media assets
    #[arg(long, global = true)]
    pub assets_folder: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Mirror the collection into the vault
    Sync {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output the report as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Preview what sync would change
    Diff {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sync_with_flags() {
        let cli = Cli::parse_from([
            "deckmirror",
            "--collection",
            "export.json",
            "--dest",
            "vault",
            "sync",
            "--dry-run",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Sync {
                dry_run: true,
                json: false
            })
        );
        assert_eq!(cli.sources.collection, Some(PathBuf::from("export.json")));
        assert_eq!(cli.sources.destination, Some(PathBuf::from("vault")));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["deckmirror", "diff", "--json", "--assets-folder", "media", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.command, Some(Commands::Diff { json: true }));
        assert_eq!(cli.sources.assets_folder.as_deref(), Some("media"));
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::parse_from(["deckmirror"]);
        assert!(cli.command.is_none());
    }
}
