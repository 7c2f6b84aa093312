//! Run results and per-file progress

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::merge::Outcome;

/// Aggregated outcome of one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    /// Conflicting target paths, in processing order
    pub conflicts: Vec<String>,
}

impl SyncResult {
    /// Count one rule outcome
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    /// Number of rules that produced an outcome or a conflict
    pub fn processed(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped + self.conflicts.len()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} unchanged={} skipped={}",
            self.created, self.updated, self.unchanged, self.skipped
        )
    }
}

/// How one rule ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Applied(Outcome),
    Conflict,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied(outcome) => outcome.fmt(f),
            Self::Conflict => f.write_str("conflict"),
        }
    }
}

/// Progress notification sent after each rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileProgress {
    /// 1-based position of the rule
    pub index: usize,
    pub total: usize,
    /// Resolved target path
    pub path: String,
    pub status: FileStatus,
}
