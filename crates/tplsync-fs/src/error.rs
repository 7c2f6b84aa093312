//! Error types for tplsync-fs

use std::path::PathBuf;

/// Result type for tplsync-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tplsync-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} document at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported document format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Unknown backup strategy: {value} (expected none or timestamp)")]
    UnknownBackupStrategy { value: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
