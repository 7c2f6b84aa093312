//! Pre-overwrite backups
//!
//! Before a managed file is replaced its previous bytes can be preserved next
//! to it as `<path>.<YYYYMMDDhhmmss>.bak`.

use crate::{Error, NormalizedPath, Result, io};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::str::FromStr;

/// Timestamp layout used in backup file names
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// How prior file contents are preserved before an overwrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStrategy {
    /// Do not keep a copy
    None,
    /// Keep a timestamped `.bak` copy beside the file
    #[default]
    Timestamp,
}

impl BackupStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Timestamp => "timestamp",
        }
    }
}

impl FromStr for BackupStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "timestamp" => Ok(Self::Timestamp),
            other => Err(Error::UnknownBackupStrategy {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for BackupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path of the timestamped backup for `path` taken at `now`.
pub fn backup_path(path: &NormalizedPath, now: DateTime<Utc>) -> NormalizedPath {
    NormalizedPath::new(format!(
        "{}.{}.bak",
        path.as_str(),
        now.format(BACKUP_TIMESTAMP_FORMAT)
    ))
}

/// Persist `content` (the bytes about to be overwritten at `path`) according
/// to `strategy`.
///
/// Returns the backup location when one was written.
pub fn backup_file(
    path: &NormalizedPath,
    content: &[u8],
    strategy: BackupStrategy,
    now: DateTime<Utc>,
) -> Result<Option<NormalizedPath>> {
    match strategy {
        BackupStrategy::None => Ok(None),
        BackupStrategy::Timestamp => {
            let target = backup_path(path, now);
            io::ensure_parent(&target)?;
            fs::write(target.to_native(), content).map_err(|e| Error::io(target.to_native(), e))?;
            tracing::debug!(path = %path, backup = %target, "Backed up previous content");
            Ok(Some(target))
        }
    }
}
