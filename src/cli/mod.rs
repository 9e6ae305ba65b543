//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// tokensync - keep design tokens in sync with a variable store
#[derive(Parser, Debug)]
#[command(name = "tokensync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.tokensync/data/tokens.db)
    #[arg(long, global = true, env = "TOKENSYNC_DB")]
    pub db: Option<PathBuf>,

    /// Actor name for the audit trail
    #[arg(long, global = true, env = "TOKENSYNC_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pull tokens from the document database into a collection
    Sync(SyncArgs),

    /// List the entries of a collection
    List {
        /// Collection name (default: from config, else "Design Tokens")
        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Export a collection as nested design-token JSON
    Export {
        /// Collection name (default: from config, else "Design Tokens")
        #[arg(short, long)]
        collection: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List collections with entry counts
    Collections,

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Document database id to query
    #[arg(short, long, conflicts_with = "input")]
    pub database: Option<String>,

    /// Read records from a JSON export instead of the API
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Target collection (default: from config, else "Design Tokens")
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Rewrite entries that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Delete entries that are no longer upstream
    #[arg(long)]
    pub prune: bool,

    /// Field mapping override, e.g. `--map name=Token` (repeatable)
    #[arg(long = "map", value_name = "PROPERTY=FIELD")]
    pub mappings: Vec<String>,

    /// Sort records by this field before transforming
    #[arg(long)]
    pub sort: Option<String>,

    /// Transform only; print tokens without writing to the store
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_args_parse() {
        let cli = Cli::parse_from([
            "tokensync",
            "sync",
            "--input",
            "pages.json",
            "--overwrite",
            "--map",
            "name=Token",
            "--map",
            "value=Hex",
        ]);
        let Commands::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.input, Some(PathBuf::from("pages.json")));
        assert!(args.overwrite);
        assert!(!args.prune);
        assert_eq!(args.mappings, vec!["name=Token", "value=Hex"]);
    }

    #[test]
    fn test_database_conflicts_with_input() {
        let result = Cli::try_parse_from([
            "tokensync",
            "sync",
            "--database",
            "db",
            "--input",
            "pages.json",
        ]);
        assert!(result.is_err());
    }
}
