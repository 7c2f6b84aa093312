//! Error types for tplsync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code for a config that cannot be loaded or does not validate
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for a run aborted before completion
pub const EXIT_SYNC: i32 = 3;
/// Exit code for a run that finished with conflicts
pub const EXIT_CONFLICTS: i32 = 4;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Config could not be loaded, expanded or validated
    #[error("{message}")]
    Config { message: String },

    /// Error from tplsync-core
    #[error(transparent)]
    Core(#[from] tplsync_core::Error),

    /// Error from tplsync-fs
    #[error(transparent)]
    Fs(#[from] tplsync_fs::Error),
}

impl CliError {
    pub fn config(error: impl std::fmt::Display) -> Self {
        Self::Config {
            message: error.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => EXIT_CONFIG,
            Self::Core(e) if e.is_conflict() => EXIT_CONFLICTS,
            Self::Core(tplsync_core::Error::Validation { .. }) => EXIT_CONFIG,
            _ => EXIT_SYNC,
        }
    }
}
