//! Filesystem primitives for tplsync
//!
//! Provides forward-slash path handling, atomic and mode-aware writes,
//! content digests with `algo:hex` checksum specs, pre-overwrite backups,
//! and format-agnostic document loading.

pub mod backup;
pub mod config;
pub mod digest;
pub mod error;
pub mod io;
pub mod path;

pub use backup::BackupStrategy;
pub use config::ConfigStore;
pub use digest::{ChecksumSpec, DigestAlgorithm, DigestError};
pub use error::{Error, Result};
pub use path::{NormalizedPath, clean};
