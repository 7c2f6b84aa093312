//! Sync configuration
//!
//! This module provides the typed configuration consumed by the sync engine:
//!
//! - [`SyncConfig`]: declared [`Source`]s, ordered [`FileRule`]s and named
//!   [`Profile`]s, plus structural validation
//! - [`Manifest`]: the on-disk document, which may also carry the
//!   `repositories` shorthand that expands into sources and rules
//! - [`RulePolicy`]: merge mode and backup strategy resolved per rule from
//!   call-site override, rule value and default
//!
//! # Example
//!
//! ```ignore
//! use tplsync_core::config::Manifest;
//!
//! let manifest: Manifest = serde_yaml::from_str(text)?;
//! let config = manifest.into_sync_config()?;
//! config.validate()?;
//! ```

mod manifest;
mod resolver;
mod sync_config;

pub use manifest::{Manifest, Repository, RepositoryFile, expand_env};
pub use resolver::{DEFAULT_BACKUP, DEFAULT_MERGE, RulePolicy, resolve_setting};
pub use sync_config::{FileRule, Profile, SYNC_CONFIG_VERSION, Source, SyncConfig};
