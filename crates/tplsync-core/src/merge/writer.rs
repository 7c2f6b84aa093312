//! Applies merge decisions to the filesystem

use chrono::{DateTime, Utc};
use tplsync_fs::backup::backup_file;
use tplsync_fs::io::{read_optional, write_file};
use tplsync_fs::{BackupStrategy, NormalizedPath, clean};

use super::{Baseline, DEFAULT_FILE_MODE, Decision, MergeMode, Outcome, decide};
use crate::archive::{ArchiveEntry, ArchiveError, format_mode};
use crate::config::RulePolicy;
use crate::lock::LockEntry;
use crate::{Error, Result};

/// Parse an octal permission string. Blank means [`DEFAULT_FILE_MODE`].
pub fn parse_file_mode(path: &str, value: Option<&str>) -> Result<u32> {
    let raw = value.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(DEFAULT_FILE_MODE);
    }

    match u32::from_str_radix(raw, 8) {
        Ok(mode) if mode <= 0o7777 => Ok(mode),
        _ => Err(Error::ModeFormat {
            path: path.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Writes incoming content according to one rule's policy
#[derive(Debug, Clone)]
pub struct MergeWriter {
    mode: MergeMode,
    backup: BackupStrategy,
    dry_run: bool,
    now: DateTime<Utc>,
}

impl MergeWriter {
    pub fn new(policy: RulePolicy, dry_run: bool, now: DateTime<Utc>) -> Self {
        Self {
            mode: policy.merge,
            backup: policy.backup,
            dry_run,
            now,
        }
    }

    /// Merge `incoming` into `target`.
    ///
    /// `label` names the target in errors and conflict reports. A conflict
    /// is returned as [`Error::Conflict`] and leaves the target untouched.
    pub fn apply(
        &self,
        target: &NormalizedPath,
        label: &str,
        incoming: &[u8],
        baseline: Baseline<'_>,
        file_mode: Option<&str>,
    ) -> Result<Outcome> {
        let current = read_optional(target)?;

        let existed = match decide(current.as_deref(), incoming, baseline, self.mode) {
            Decision::Unchanged => return Ok(Outcome::Unchanged),
            Decision::Skip => return Ok(Outcome::Skipped),
            Decision::Conflict => {
                return Err(Error::Conflict {
                    path: label.to_string(),
                });
            }
            Decision::Write { existed } => existed,
        };
        let outcome = if existed {
            Outcome::Updated
        } else {
            Outcome::Created
        };

        // Mode is validated before any backup or write
        let permissions = parse_file_mode(label, file_mode)?;

        if self.dry_run {
            tracing::debug!(path = %target, outcome = %outcome, "[dry-run] Would write");
            return Ok(outcome);
        }

        if let Some(previous) = current.as_deref() {
            backup_file(target, previous, self.backup, self.now)?;
        }
        write_file(target, incoming, permissions)?;

        tracing::debug!(path = %target, outcome = %outcome, mode = %format_mode(permissions), "Wrote target");
        Ok(outcome)
    }

    /// Merge every archive entry underneath `root`.
    ///
    /// The first entry is merged against the rule's recorded hash. Later
    /// entries fast-forward once the rule has been applied before and need
    /// a clean slate otherwise. Outcomes fold by [`Outcome::rank`].
    pub fn apply_entries(
        &self,
        root: &NormalizedPath,
        label: &str,
        entries: &[ArchiveEntry],
        rule_mode: Option<&str>,
        lock_entry: Option<&LockEntry>,
    ) -> Result<Outcome> {
        let mut folded: Option<Outcome> = None;

        for (index, entry) in entries.iter().enumerate() {
            let target = root.join(&entry.path);
            if !target.is_within(root) {
                return Err(ArchiveError::PathEscape {
                    path: entry.path.clone(),
                }
                .into());
            }

            let entry_label = clean(&format!("{}/{}", label, entry.path));
            let baseline = match (index, lock_entry) {
                (0, Some(lock)) => Baseline::from_hash(Some(&lock.applied_hash)),
                (_, Some(_)) => Baseline::AssumeCurrent,
                (_, None) => Baseline::Unknown,
            };
            let entry_mode = rule_mode
                .map(str::to_string)
                .filter(|mode| !mode.trim().is_empty())
                .or_else(|| entry.mode.map(format_mode));

            let outcome = self.apply(&target, &entry_label, &entry.body, baseline, entry_mode.as_deref())?;
            folded = Some(match folded {
                Some(previous) => previous.combine(outcome),
                None => outcome,
            });
        }

        Ok(folded.unwrap_or(Outcome::Unchanged))
    }
}
