//! SyncEngine implementation
//!
//! The SyncEngine drives one run: for every rule it fetches the source,
//! verifies and decodes the artifact, merges the result into the working
//! tree and stages a lock entry. The lock file is only written when the run
//! finished without conflicts and outside dry-run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tplsync_fs::NormalizedPath;
use tplsync_fs::digest::{sha256_hex, verify_checksum};

use super::options::SyncOptions;
use super::report::{FileProgress, FileStatus, SyncResult};
use crate::archive::{self, DecodedArtifact, Encoding, format_mode, normalize_extract};
use crate::config::{FileRule, RulePolicy, SyncConfig};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::lock::{LOCK_FILE_NAME, LockEntry, LockFile};
use crate::merge::{Baseline, MergeWriter, Outcome};
use crate::{Error, Result};

/// Result of applying one rule, before it is tallied
struct AppliedRule {
    outcome: Outcome,
    entry: LockEntry,
}

/// Resolve the sync root to an absolute path.
///
/// Existing directories are canonicalized; a root that does not exist yet
/// is made absolute against the current directory.
pub fn resolve_root(root_dir: &Path) -> Result<NormalizedPath> {
    let resolved = match dunce::canonicalize(root_dir) {
        Ok(path) => path,
        Err(_) => std::path::absolute(root_dir)?,
    };
    Ok(NormalizedPath::new(resolved))
}

/// Resolve a rule path: absolute paths are kept, relative ones join `root`.
pub fn resolve_target(root: &NormalizedPath, rule_path: &str) -> NormalizedPath {
    let normalized = NormalizedPath::new(rule_path);
    if normalized.is_absolute() {
        normalized
    } else {
        root.join(rule_path)
    }
}

/// Engine for synchronizing template files into a working tree
pub struct SyncEngine<F = HttpFetcher> {
    fetcher: F,
}

impl SyncEngine<HttpFetcher> {
    /// Engine backed by the blocking HTTP client
    pub fn http() -> Result<Self> {
        Ok(Self::new(HttpFetcher::new()?))
    }
}

impl<F: Fetcher> SyncEngine<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Run every selected rule of `config`.
    ///
    /// # Errors
    ///
    /// - [`Error::RootDirRequired`] / [`Error::Validation`] before any I/O
    /// - [`Error::Conflicts`] after the loop when any rule conflicted; it
    ///   carries the accumulated [`SyncResult`] and the lock is not written
    /// - any other error aborts the run immediately, lock untouched
    pub fn sync(&self, config: &SyncConfig, mut options: SyncOptions<'_>) -> Result<SyncResult> {
        if options.root_dir.as_os_str().is_empty() {
            return Err(Error::RootDirRequired);
        }
        config.validate()?;
        let rules = config.rules_for_profile(options.profile.as_deref())?;

        let root = resolve_root(&options.root_dir)?;
        let lock_path: PathBuf = options
            .lock_path
            .clone()
            .unwrap_or_else(|| root.join(LOCK_FILE_NAME).to_native());
        let mut lock = LockFile::load(&lock_path)?;

        tracing::info!(
            root = %root,
            rules = rules.len(),
            dry_run = options.dry_run,
            profile = options.profile.as_deref().unwrap_or_default(),
            "Starting sync"
        );

        let mut result = SyncResult::default();
        let total = rules.len();

        for (index, rule) in rules.into_iter().enumerate() {
            let target = resolve_target(&root, &rule.path);
            let key = target.as_str().to_string();
            let now = options.now();

            let applied = self.sync_rule(config, rule, &target, lock.get(&key), &options, now);
            let status = match applied {
                Ok(applied) => {
                    tracing::info!(path = %rule.path, outcome = %applied.outcome, "Synced file");
                    result.record(applied.outcome);
                    lock.insert(key, applied.entry);
                    FileStatus::Applied(applied.outcome)
                }
                Err(Error::Conflict { path }) => {
                    tracing::warn!(path = %path, "Conflict: local and upstream content both changed");
                    result.conflicts.push(path);
                    FileStatus::Conflict
                }
                Err(e) => return Err(e),
            };

            options.notify(&FileProgress {
                index: index + 1,
                total,
                path: target.as_str().to_string(),
                status,
            });
        }

        if result.has_conflicts() {
            tracing::warn!(
                conflicts = result.conflicts.len(),
                "Sync finished with conflicts, lock file not written"
            );
            return Err(Error::Conflicts { result });
        }

        if options.dry_run {
            tracing::info!("[dry-run] Lock file not written");
        } else {
            lock.save(&lock_path)?;
        }

        tracing::info!(
            created = result.created,
            updated = result.updated,
            unchanged = result.unchanged,
            skipped = result.skipped,
            "Sync complete"
        );
        Ok(result)
    }

    fn sync_rule(
        &self,
        config: &SyncConfig,
        rule: &FileRule,
        target: &NormalizedPath,
        lock_entry: Option<&LockEntry>,
        options: &SyncOptions<'_>,
        now: DateTime<Utc>,
    ) -> Result<AppliedRule> {
        let policy = RulePolicy::resolve(
            rule,
            options.mode_override.as_deref(),
            options.backup_override.as_deref(),
        )?;
        let encoding: Encoding = rule.encoding.parse()?;
        let extract = normalize_extract(&rule.extract)?;
        let source = config.sources.get(&rule.source).ok_or_else(|| {
            Error::validation(format!("source {:?} not found in sources", rule.source))
        })?;

        tracing::debug!(
            path = %rule.path,
            url = %source.url,
            merge = %policy.merge,
            backup = %policy.backup,
            encoding = %encoding,
            "Processing rule"
        );

        let artifact = self.fetcher.fetch(source)?;
        verify(&artifact, rule.download_checksum.as_deref(), "download", &rule.path)?;

        let decoded = archive::decode(&artifact, encoding, &extract, rule.expand_archive)?;
        let writer = MergeWriter::new(policy, options.dry_run, now);

        let (outcome, applied_hash) = match decoded {
            DecodedArtifact::Single { body, mode } => {
                verify(&body, rule.output_checksum.as_deref(), "output", &rule.path)?;

                let file_mode = rule
                    .mode
                    .clone()
                    .filter(|mode| !mode.trim().is_empty())
                    .or_else(|| mode.map(format_mode));
                let baseline = Baseline::from_hash(lock_entry.map(|e| e.applied_hash.as_str()));

                let outcome = writer.apply(target, &rule.path, &body, baseline, file_mode.as_deref())?;
                (outcome, sha256_hex(&body))
            }
            DecodedArtifact::Multi(entries) => {
                if rule
                    .output_checksum
                    .as_deref()
                    .is_some_and(|spec| !spec.trim().is_empty())
                {
                    return Err(Error::validation(format!(
                        "{}: output_checksum cannot be used when extract resolves to multiple files",
                        rule.path
                    )));
                }

                let outcome =
                    writer.apply_entries(target, &rule.path, &entries, rule.mode.as_deref(), lock_entry)?;
                let primary = entries.first().map(|e| e.body.as_slice()).unwrap_or_default();
                (outcome, sha256_hex(primary))
            }
        };

        let source_hash = sha256_hex(&artifact);
        let entry = match lock_entry {
            Some(existing)
                if outcome == Outcome::Unchanged
                    && existing.source_url == source.url
                    && existing.applied_hash == applied_hash
                    && existing.source_hash == source_hash =>
            {
                existing.clone()
            }
            _ => LockEntry::new(source.url.clone(), applied_hash, source_hash, now),
        };

        Ok(AppliedRule { outcome, entry })
    }
}

fn verify(content: &[u8], spec: Option<&str>, stage: &'static str, path: &str) -> Result<()> {
    match spec {
        Some(spec) => verify_checksum(content, spec).map_err(|source| Error::Checksum {
            path: path.to_string(),
            stage,
            source,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_target_relative_and_absolute() {
        let root = NormalizedPath::new("/work/repo");
        assert_eq!(resolve_target(&root, "ci/a.yml").as_str(), "/work/repo/ci/a.yml");
        assert_eq!(resolve_target(&root, "/etc/tpl/a.yml").as_str(), "/etc/tpl/a.yml");
        assert_eq!(resolve_target(&root, "./x/../b.yml").as_str(), "/work/repo/b.yml");
    }

    #[test]
    fn test_resolve_root_handles_missing_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("not-yet");

        let resolved = resolve_root(&missing).unwrap();

        assert!(resolved.is_absolute());
        assert!(resolved.as_str().ends_with("/not-yet"));
    }

    #[test]
    fn test_verify_reports_stage() {
        let err = verify(b"abc", Some("sha256:00"), "download", "a.txt").unwrap_err();
        assert!(err.to_string().starts_with("download checksum for a.txt failed"));
        assert!(verify(b"abc", None, "output", "a.txt").is_ok());
        assert!(verify(b"abc", Some(""), "output", "a.txt").is_ok());
    }
}
