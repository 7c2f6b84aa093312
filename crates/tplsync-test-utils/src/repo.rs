//! [`TestRepo`]: a temporary working tree for sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory with helper methods for test setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use tplsync_test_utils::repo::TestRepo;
///
/// let repo = TestRepo::new();
/// repo.write_file("ci/lint.yml", "rules: []\n");
/// repo.assert_file_content("ci/lint.yml", "rules: []\n");
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap_or_else(|e| panic!("TestRepo::new: {e}")),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the repo.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write_file(&self, rel: &str, content: impl AsRef<[u8]>) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("TestRepo::write_file: mkdir {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestRepo::write_file: {}: {e}", path.display()));
    }

    /// Read `rel` as UTF-8.
    pub fn read_file(&self, rel: &str) -> String {
        let path = self.path(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("TestRepo::read_file: {}: {e}", path.display()))
    }

    /// Relative paths of every file under the root, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut found = Vec::new();
        collect_files(self.root(), self.root(), &mut found);
        found.sort();
        found
    }

    /// Files whose name ends in `.bak`, relative to the root.
    pub fn backups(&self) -> Vec<String> {
        self.files()
            .into_iter()
            .filter(|path| path.ends_with(".bak"))
            .collect()
    }

    /// Assert that `rel` exists.
    pub fn assert_file_exists(&self, rel: &str) {
        assert!(self.path(rel).exists(), "Expected file {rel} to exist");
    }

    /// Assert that `rel` does not exist.
    pub fn assert_file_missing(&self, rel: &str) {
        assert!(!self.path(rel).exists(), "Expected file {rel} not to exist");
    }

    /// Assert that `rel` holds exactly `expected`.
    pub fn assert_file_content(&self, rel: &str, expected: &str) {
        assert_eq!(self.read_file(rel), expected, "Unexpected content in {rel}");
    }
}

fn collect_files(root: &Path, dir: &Path, found: &mut Vec<String>) {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("TestRepo::files: read_dir {}: {e}", dir.display()));
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, found);
        } else if let Ok(rel) = path.strip_prefix(root) {
            found.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}
