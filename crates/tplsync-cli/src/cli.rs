//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// tplsync - Keep template files in sync with their upstream sources
#[derive(Parser, Debug)]
#[command(name = "tplsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Sync document (YAML, TOML or JSON)
    #[arg(
        short,
        long,
        global = true,
        env = "TPLSYNC_CONFIG",
        default_value = "tplsync.yaml"
    )]
    pub config: PathBuf,

    /// Working tree root; defaults to the directory holding the config
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Fetch every rule's source and merge it into the working tree
    ///
    /// Examples:
    ///   tplsync sync                      # Use tplsync.yaml in the current directory
    ///   tplsync sync --dry-run            # Classify without writing anything
    ///   tplsync sync --mode overwrite     # Force upstream content everywhere
    ///   tplsync -c ci/templates.toml sync --profile docs
    Sync {
        /// Merge mode for every rule (overwrite, keep_local, three_way)
        #[arg(long)]
        mode: Option<String>,

        /// Backup strategy for every rule (none, timestamp)
        #[arg(long)]
        backup: Option<String>,

        /// Report what would change without touching files
        #[arg(long)]
        dry_run: bool,

        /// Append the files of this profile to the base rules
        #[arg(short, long)]
        profile: Option<String>,

        /// Lock file location (default: <root>/tplsync.lock)
        #[arg(long)]
        lock: Option<PathBuf>,
    },

    /// Write a starter config at the --config path
    Init,

    /// Load and validate the config, then list the rules it declares
    Validate {
        /// Include the files of this profile
        #[arg(short, long)]
        profile: Option<String>,
    },
}
