//! Shared test utilities for the tplsync workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`archive`]: tar, tar+gzip, tar+xz and zstd artifact builders,
//!   including entries with hostile names
//! - [`repo`]: [`TestRepo`](repo::TestRepo), a temporary working tree with
//!   file helpers and assertions

pub mod archive;
pub mod repo;
