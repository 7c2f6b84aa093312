//! Per-target lock entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What was last applied at one target path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// URL the artifact was fetched from
    pub source_url: String,

    /// sha256 hex of the bytes written (or found identical) on the last apply
    pub applied_hash: String,

    /// sha256 hex of the raw downloaded artifact
    pub source_hash: String,

    pub updated_at: DateTime<Utc>,
}

impl LockEntry {
    pub fn new(
        source_url: impl Into<String>,
        applied_hash: impl Into<String>,
        source_hash: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            applied_hash: applied_hash.into(),
            source_hash: source_hash.into(),
            updated_at,
        }
    }
}
