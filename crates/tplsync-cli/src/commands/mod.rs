//! Command implementations

mod init;
mod sync;
mod validate;

pub use init::run_init;
pub use sync::{SyncArgs, run_sync};
pub use validate::run_validate;

use std::path::{Path, PathBuf};

use tplsync_core::{Manifest, SyncConfig};
use tplsync_fs::{ConfigStore, NormalizedPath};

use crate::error::{CliError, Result};

/// Load `path`, expand the repositories shorthand and validate the result.
///
/// Every failure here is a configuration error.
pub fn load_config(path: &Path) -> Result<SyncConfig> {
    let manifest: Manifest = ConfigStore::new()
        .load(&NormalizedPath::new(path))
        .map_err(CliError::config)?;
    let config = manifest.into_sync_config().map_err(CliError::config)?;
    config.validate().map_err(CliError::config)?;

    tracing::debug!(
        path = %path.display(),
        sources = config.sources.len(),
        files = config.files.len(),
        "Loaded config"
    );
    Ok(config)
}

/// Root used when `--root` is not given: the directory holding the config.
pub fn default_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
