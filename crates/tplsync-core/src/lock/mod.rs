//! Lock file: the persisted merge baseline
//!
//! The lock file records, per absolute target path, the hash of the bytes
//! last applied there. Three-way merges compare local and upstream content
//! against that hash. It is stored as TOML and only rewritten at the end of
//! a sync run that finished without conflicts.

mod entry;

pub use entry::LockEntry;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tplsync_fs::NormalizedPath;
use tplsync_fs::io::write_atomic;

use crate::{Error, Result};

/// Default lock file name, placed in the sync root
pub const LOCK_FILE_NAME: &str = "tplsync.lock";

/// Current lock format version
pub const LOCK_VERSION: &str = "1";

fn default_version() -> String {
    LOCK_VERSION.to_string()
}

/// Mapping of absolute target path to [`LockEntry`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub files: BTreeMap<String, LockEntry>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self::new()
    }
}

impl LockFile {
    /// Create an empty lock at the current version
    pub fn new() -> Self {
        Self {
            version: default_version(),
            files: BTreeMap::new(),
        }
    }

    /// Load the lock file at `path` under a shared lock.
    ///
    /// A missing file yields an empty lock; an unparsable one is
    /// [`Error::CorruptLock`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No lock file, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(tplsync_fs::Error::io(path, e).into()),
        };
        file.lock_shared().map_err(|_| tplsync_fs::Error::LockFailed {
            path: path.to_path_buf(),
        })?;

        // Read through the locked handle
        let mut content = String::new();
        (&file)
            .read_to_string(&mut content)
            .map_err(|e| tplsync_fs::Error::io(path, e))?;

        let mut lock: LockFile = toml::from_str(&content).map_err(|e| Error::CorruptLock {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        if lock.version.trim().is_empty() {
            lock.version = default_version();
        }

        tracing::debug!(path = %path.display(), entries = lock.files.len(), "Loaded lock file");
        Ok(lock)
    }

    /// Serialize as TOML and replace the file at `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        write_atomic(&NormalizedPath::new(path), content.as_bytes())?;
        tracing::debug!(path = %path.display(), entries = self.files.len(), "Saved lock file");
        Ok(())
    }

    pub fn get(&self, target: &str) -> Option<&LockEntry> {
        self.files.get(target)
    }

    /// Stage `entry` for `target`, replacing any previous one.
    pub fn insert(&mut self, target: impl Into<String>, entry: LockEntry) {
        self.files.insert(target.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample_entry() -> LockEntry {
        LockEntry::new(
            "https://example.com/ci.yml",
            "aa",
            "bb",
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        )
    }

    #[test]
    fn lock_new_has_current_version() {
        let lock = LockFile::new();
        assert_eq!(lock.version, "1");
        assert!(lock.is_empty());
    }

    #[test]
    fn lock_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let lock = LockFile::load(&dir.path().join(LOCK_FILE_NAME)).unwrap();
        assert_eq!(lock, LockFile::new());
    }

    #[test]
    fn lock_save_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let mut lock = LockFile::new();
        lock.insert("/work/ci.yml", sample_entry());
        lock.save(&path).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![LOCK_FILE_NAME.to_string()]);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("version = \"1\""));
        assert!(raw.contains("/work/ci.yml"));
        assert!(raw.contains("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn lock_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);
        std::fs::write(&path, "files = [not toml").unwrap();

        let err = LockFile::load(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptLock { .. }));
    }
}
