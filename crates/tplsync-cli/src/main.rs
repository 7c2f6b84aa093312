//! tplsync CLI
//!
//! Loads a sync document, runs the engine against a working tree and maps
//! the outcome to an exit code.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to initialise logging: {}", "warning".yellow().bold(), e);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    tracing::debug!(config = %cli.config.display(), "Starting tplsync");

    match cli.command {
        Commands::Sync {
            mode,
            backup,
            dry_run,
            profile,
            lock,
        } => commands::run_sync(
            &cli.config,
            cli.root.as_deref(),
            commands::SyncArgs {
                mode,
                backup,
                dry_run,
                profile,
                lock,
            },
        ),
        Commands::Init => commands::run_init(&cli.config),
        Commands::Validate { profile } => commands::run_validate(&cli.config, profile.as_deref()),
    }
}
