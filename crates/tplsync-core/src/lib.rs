//! Sync engine for tplsync
//!
//! Keeps template files (CI pipelines, lint configs, devcontainer files)
//! in a working tree synchronized with remote HTTP sources without silently
//! clobbering local edits:
//!
//! - **Config**: typed sources and file rules, validation, profiles and the
//!   `repositories` shorthand
//! - **Fetch**: the HTTP seam
//! - **Archive**: zstd, tar+gzip and tar+xz decoding with safe extraction
//! - **Merge**: the per-file overwrite / keep_local / three_way decision
//! - **Lock**: the persisted merge baseline
//! - **SyncEngine**: drives a whole run and aggregates the result
//!
//! # Architecture
//!
//! ```text
//!                   tplsync-cli
//!                        |
//!                  tplsync-core
//!     config  fetch  archive  merge  lock  sync
//!                        |
//!                   tplsync-fs
//!       path  io  digest  backup  config store
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tplsync_core::{SyncEngine, SyncOptions};
//!
//! let engine = SyncEngine::http()?;
//! let result = engine.sync(&config, SyncOptions::new("/path/to/repo"))?;
//! println!("created={} updated={}", result.created, result.updated);
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lock;
pub mod merge;
pub mod sync;

pub use archive::{ArchiveEntry, ArchiveError, DecodedArtifact, Encoding};
pub use config::{FileRule, Manifest, Profile, RulePolicy, Source, SyncConfig};
pub use error::{Error, Result};
pub use fetch::{Fetcher, HttpFetcher};
pub use lock::{LOCK_FILE_NAME, LockEntry, LockFile};
pub use merge::{Baseline, MergeMode, Outcome};
pub use sync::{FileProgress, FileStatus, SyncEngine, SyncOptions, SyncResult};
