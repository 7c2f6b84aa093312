//! Merge engine
//!
//! Decides what happens to one target file given its current bytes, the
//! incoming bytes and the hash recorded in the lock file, then performs the
//! write through [`MergeWriter`].
//!
//! | mode         | target missing | identical | otherwise                          |
//! |--------------|----------------|-----------|------------------------------------|
//! | `overwrite`  | created        | unchanged | updated                            |
//! | `keep_local` | created        | unchanged | skipped                            |
//! | `three_way`  | created        | unchanged | see [`decide`] for baseline checks |

mod writer;

pub use writer::{MergeWriter, parse_file_mode};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tplsync_fs::digest::sha256_hex;

use crate::Error;

/// Permission bits used when neither the rule nor the archive supplies any
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// How local edits are reconciled with upstream content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Upstream always wins
    Overwrite,
    /// An existing local file always wins
    KeepLocal,
    /// Compare both sides against the last applied hash
    ThreeWay,
}

impl MergeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::KeepLocal => "keep_local",
            Self::ThreeWay => "three_way",
        }
    }
}

impl FromStr for MergeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "keep_local" => Ok(Self::KeepLocal),
            "three_way" => Ok(Self::ThreeWay),
            other => Err(Error::UnsupportedMode {
                mode: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying one rule or entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    Skipped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Skipped => "skipped",
        }
    }

    /// Priority when folding several entry outcomes into one rule outcome
    pub fn rank(&self) -> u8 {
        match self {
            Self::Updated => 3,
            Self::Created => 2,
            Self::Unchanged => 1,
            Self::Skipped => 0,
        }
    }

    /// The higher-priority of two outcomes
    pub fn combine(self, other: Self) -> Self {
        if other.rank() > self.rank() { other } else { self }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the lock file knows about a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline<'a> {
    /// Nothing recorded
    Unknown,
    /// sha256 hex of the bytes last applied
    Applied(&'a str),
    /// Treat the current local bytes as the last applied ones
    AssumeCurrent,
}

impl<'a> Baseline<'a> {
    /// Baseline from an optional recorded hash; blank counts as unknown.
    pub fn from_hash(hash: Option<&'a str>) -> Self {
        match hash.map(str::trim) {
            Some(hash) if !hash.is_empty() => Self::Applied(hash),
            _ => Self::Unknown,
        }
    }
}

/// What to do with a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Write incoming bytes; `existed` selects created vs updated
    Write { existed: bool },
    Unchanged,
    Skip,
    Conflict,
}

/// Pure merge decision.
///
/// Identical content short-circuits to [`Decision::Unchanged`] in every
/// mode. For `three_way` with an existing, differing file:
/// - no baseline: conflict
/// - local still matches the baseline: write (upstream moved)
/// - upstream still matches the baseline: skip (local moved)
/// - both moved: conflict
pub fn decide(
    current: Option<&[u8]>,
    incoming: &[u8],
    baseline: Baseline<'_>,
    mode: MergeMode,
) -> Decision {
    let Some(current) = current else {
        return Decision::Write { existed: false };
    };

    let current_hash = sha256_hex(current);
    let incoming_hash = sha256_hex(incoming);
    if current_hash == incoming_hash {
        return Decision::Unchanged;
    }

    match mode {
        MergeMode::Overwrite => Decision::Write { existed: true },
        MergeMode::KeepLocal => Decision::Skip,
        MergeMode::ThreeWay => {
            let baseline = match baseline {
                Baseline::Unknown => return Decision::Conflict,
                Baseline::Applied(hash) => hash,
                Baseline::AssumeCurrent => current_hash.as_str(),
            };
            if current_hash == baseline {
                Decision::Write { existed: true }
            } else if incoming_hash == baseline {
                Decision::Skip
            } else {
                Decision::Conflict
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_missing_target_is_written_in_every_mode() {
        for mode in [MergeMode::Overwrite, MergeMode::KeepLocal, MergeMode::ThreeWay] {
            assert_eq!(
                decide(None, b"new", Baseline::Unknown, mode),
                Decision::Write { existed: false }
            );
        }
    }

    #[test]
    fn test_identical_content_short_circuits() {
        for mode in [MergeMode::Overwrite, MergeMode::KeepLocal, MergeMode::ThreeWay] {
            assert_eq!(
                decide(Some(b"same"), b"same", Baseline::Unknown, mode),
                Decision::Unchanged
            );
        }
    }

    #[rstest]
    #[case::fast_forward("v1", "v2", "v1", Decision::Write { existed: true })]
    #[case::local_wins("local", "v1", "v1", Decision::Skip)]
    #[case::both_diverged("local", "v2", "v1", Decision::Conflict)]
    fn test_three_way(
        #[case] current: &str,
        #[case] incoming: &str,
        #[case] applied: &str,
        #[case] expected: Decision,
    ) {
        let applied = sha256_hex(applied.as_bytes());
        assert_eq!(
            decide(
                Some(current.as_bytes()),
                incoming.as_bytes(),
                Baseline::Applied(&applied),
                MergeMode::ThreeWay
            ),
            expected
        );
    }

    #[test]
    fn test_three_way_without_baseline_conflicts() {
        assert_eq!(
            decide(Some(b"local"), b"v1", Baseline::Unknown, MergeMode::ThreeWay),
            Decision::Conflict
        );
        assert_eq!(Baseline::from_hash(Some("  ")), Baseline::Unknown);
    }

    #[test]
    fn test_three_way_assume_current_fast_forwards() {
        assert_eq!(
            decide(Some(b"old"), b"new", Baseline::AssumeCurrent, MergeMode::ThreeWay),
            Decision::Write { existed: true }
        );
    }

    #[test]
    fn test_keep_local_and_overwrite() {
        assert_eq!(
            decide(Some(b"local"), b"v1", Baseline::Unknown, MergeMode::KeepLocal),
            Decision::Skip
        );
        assert_eq!(
            decide(Some(b"local"), b"v1", Baseline::Unknown, MergeMode::Overwrite),
            Decision::Write { existed: true }
        );
    }

    #[test]
    fn test_outcome_combine_priority() {
        assert_eq!(Outcome::Created.combine(Outcome::Updated), Outcome::Updated);
        assert_eq!(Outcome::Unchanged.combine(Outcome::Created), Outcome::Created);
        assert_eq!(Outcome::Skipped.combine(Outcome::Unchanged), Outcome::Unchanged);
        assert_eq!(Outcome::Skipped.combine(Outcome::Skipped), Outcome::Skipped);
    }

    #[test]
    fn test_merge_mode_parse() {
        assert_eq!("Three_Way".parse::<MergeMode>().unwrap(), MergeMode::ThreeWay);
        assert!(matches!(
            "rebase".parse::<MergeMode>(),
            Err(Error::UnsupportedMode { .. })
        ));
    }
}
