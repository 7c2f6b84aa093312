//! Error types for tplsync-core

use std::path::PathBuf;

use crate::archive::ArchiveError;
use crate::sync::SyncResult;
use tplsync_fs::DigestError;

/// Result type for tplsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tplsync-core operations
///
/// Every variant aborts a sync run except [`Error::Conflict`], which the
/// orchestrator collects per path, and [`Error::Conflicts`], the run-level
/// sentinel returned once all rules have been processed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration has the wrong shape
    #[error("Invalid configuration: {message}")]
    Validation { message: String },

    /// Sync was invoked without a root directory
    #[error("Root directory is required")]
    RootDirRequired,

    /// Server answered with a non-2xx status
    #[error("Download failed: {url} status={status}")]
    Fetch { url: String, status: u16 },

    /// Request could not be completed
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Download or output checksum failed to parse or verify
    #[error("{stage} checksum for {path} failed: {source}")]
    Checksum {
        path: String,
        stage: &'static str,
        #[source]
        source: DigestError,
    },

    /// Archive decoding or selection failed
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// File mode is not a valid octal permission string
    #[error("Invalid file mode {value:?} for {path}")]
    ModeFormat { path: String, value: String },

    /// Merge mode is not one of overwrite, keep_local, three_way
    #[error("Unsupported merge mode {mode:?} (expected overwrite, keep_local or three_way)")]
    UnsupportedMode { mode: String },

    /// Local and upstream content both diverged from the recorded baseline
    #[error("Conflict at {path}: local content differs from the last synced version")]
    Conflict { path: String },

    /// Lock file exists but cannot be parsed
    #[error("Lock file {path} is corrupt: {message}")]
    CorruptLock { path: PathBuf, message: String },

    /// Run finished but at least one rule conflicted; the lock was not written
    #[error("Sync finished with {} conflict(s)", .result.conflicts.len())]
    Conflicts { result: SyncResult },

    /// Filesystem error from tplsync-fs
    #[error(transparent)]
    Fs(#[from] tplsync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether this is the run-level conflict sentinel.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflicts { .. })
    }

    /// The partial result carried by the conflict sentinel.
    pub fn sync_result(&self) -> Option<&SyncResult> {
        match self {
            Self::Conflicts { result } => Some(result),
            _ => None,
        }
    }
}
