//! Artifact builders for archive and decoding tests.
//!
//! Entry names are written into the tar header verbatim, so fixtures can
//! carry names such as `../../etc/passwd` that `tar::Builder::append_path`
//! would refuse.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::{EntryType, Header};
use xz2::write::XzEncoder;

/// One member of a fixture archive
#[derive(Debug, Clone)]
pub struct TarEntry {
    pub name: String,
    pub body: Vec<u8>,
    pub mode: u32,
    pub kind: EntryType,
    pub link: Option<String>,
}

impl TarEntry {
    /// Regular file with mode `0644`
    pub fn file(name: &str, body: impl AsRef<[u8]>) -> Self {
        Self {
            name: name.to_string(),
            body: body.as_ref().to_vec(),
            mode: 0o644,
            kind: EntryType::Regular,
            link: None,
        }
    }

    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            body: Vec::new(),
            mode: 0o755,
            kind: EntryType::Directory,
            link: None,
        }
    }

    pub fn symlink(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            body: Vec::new(),
            mode: 0o777,
            kind: EntryType::Symlink,
            link: Some(target.to_string()),
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

/// Build an uncompressed tar stream.
///
/// # Panics
/// Panics if a name exceeds the 100-byte header field or the builder fails.
pub fn tar_bytes(entries: &[TarEntry]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    for entry in entries {
        let mut header = Header::new_gnu();
        let name = entry.name.as_bytes();
        assert!(name.len() <= 100, "tar fixture name too long: {}", entry.name);
        {
            let gnu = header
                .as_gnu_mut()
                .unwrap_or_else(|| panic!("tar fixture: GNU header expected"));
            gnu.name[..name.len()].copy_from_slice(name);
        }
        header.set_entry_type(entry.kind);
        header.set_mode(entry.mode);
        header.set_size(entry.body.len() as u64);
        if let Some(link) = &entry.link {
            header
                .set_link_name(link)
                .unwrap_or_else(|e| panic!("tar fixture: bad link name {link}: {e}"));
        }
        header.set_cksum();

        builder
            .append(&header, entry.body.as_slice())
            .unwrap_or_else(|e| panic!("tar fixture: failed to append {}: {e}", entry.name));
    }

    builder
        .into_inner()
        .unwrap_or_else(|e| panic!("tar fixture: failed to finish archive: {e}"))
}

/// Build a `tar+gzip` artifact.
pub fn tar_gz(entries: &[TarEntry]) -> Vec<u8> {
    gzip(&tar_bytes(entries))
}

/// Build a `tar+xz` artifact.
pub fn tar_xz(entries: &[TarEntry]) -> Vec<u8> {
    let mut encoder = XzEncoder::new(Vec::new(), 6);
    encoder
        .write_all(&tar_bytes(entries))
        .unwrap_or_else(|e| panic!("xz fixture: write failed: {e}"));
    encoder
        .finish()
        .unwrap_or_else(|e| panic!("xz fixture: finish failed: {e}"))
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .unwrap_or_else(|e| panic!("gzip fixture: write failed: {e}"));
    encoder
        .finish()
        .unwrap_or_else(|e| panic!("gzip fixture: finish failed: {e}"))
}

/// Build a `zstd` single-file artifact.
pub fn zstd_frame(bytes: &[u8]) -> Vec<u8> {
    zstd::encode_all(bytes, 0).unwrap_or_else(|e| panic!("zstd fixture: encode failed: {e}"))
}
