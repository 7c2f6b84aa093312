//! Sync command implementation

use std::path::{Path, PathBuf};

use colored::Colorize;

use tplsync_core::{Error, FileProgress, FileStatus, Outcome, SyncEngine, SyncOptions, SyncResult};

use super::{default_root, load_config};
use crate::error::Result;

/// Flags of the `sync` subcommand
#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub mode: Option<String>,
    pub backup: Option<String>,
    pub dry_run: bool,
    pub profile: Option<String>,
    pub lock: Option<PathBuf>,
}

/// Run the sync command
pub fn run_sync(config_path: &Path, root: Option<&Path>, args: SyncArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let root = root.map(Path::to_path_buf).unwrap_or_else(|| default_root(config_path));

    if args.dry_run {
        println!("{} Dry run, no files will be written", "=>".blue().bold());
    }

    let mut options = SyncOptions::new(root)
        .dry_run(args.dry_run)
        .on_file(print_progress);
    if let Some(mode) = args.mode {
        options = options.mode_override(mode);
    }
    if let Some(backup) = args.backup {
        options = options.backup_override(backup);
    }
    if let Some(profile) = args.profile {
        options = options.profile(profile);
    }
    if let Some(lock) = args.lock {
        options = options.lock_path(lock);
    }

    let engine = SyncEngine::http()?;
    match engine.sync(&config, options) {
        Ok(result) => {
            print_summary(&result);
            Ok(())
        }
        Err(Error::Conflicts { result }) => {
            print_summary(&result);
            for path in &result.conflicts {
                println!("{}: {}", "conflict".red().bold(), path);
            }
            Err(Error::Conflicts { result }.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_progress(progress: &FileProgress) {
    let status = match progress.status {
        FileStatus::Applied(Outcome::Created) => "created".green(),
        FileStatus::Applied(Outcome::Updated) => "updated".cyan(),
        FileStatus::Applied(Outcome::Unchanged) => "unchanged".dimmed(),
        FileStatus::Applied(Outcome::Skipped) => "skipped".yellow(),
        FileStatus::Conflict => "conflict".red().bold(),
    };
    println!(
        "   [{}/{}] {:>9} {}",
        progress.index, progress.total, status, progress.path
    );
}

fn print_summary(result: &SyncResult) {
    let marker = if result.has_conflicts() {
        "!!".red().bold()
    } else {
        "OK".green().bold()
    };
    println!("{} {}", marker, result);
}
