//! Sync orchestration
//!
//! This module provides:
//! - **engine**: the [`SyncEngine`] run loop and target resolution
//! - **options**: per-run [`SyncOptions`] (overrides, dry-run, profile,
//!   clock and progress callback)
//! - **report**: the aggregated [`SyncResult`] and [`FileProgress`] events

mod engine;
mod options;
mod report;

pub use engine::{SyncEngine, resolve_root, resolve_target};
pub use options::SyncOptions;
pub use report::{FileProgress, FileStatus, SyncResult};
