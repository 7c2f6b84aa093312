//! Artifact decoding and archive member selection
//!
//! A downloaded artifact is turned into either one output body or a flat
//! list of [`ArchiveEntry`] values:
//!
//! - identity (`""`): the artifact itself
//! - `zstd`: the decompressed stream as one file
//! - `tar+gzip` / `tar+xz`: regular files from the tar stream, filtered
//!   through the `extract` selector or expanded whole
//!
//! Entry names are cleaned lexically and rejected when they would land
//! outside the archive root.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use flate2::read::GzDecoder;
use tplsync_fs::clean;
use xz2::read::XzDecoder;

/// Archive-level errors
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Unsupported encoding {encoding:?} (expected zstd, tar+gzip or tar+xz)")]
    UnsupportedEncoding { encoding: String },

    #[error("Archive entry path escapes root: {path:?}")]
    PathEscape { path: String },

    #[error("Invalid archive entry path {path:?}")]
    InvalidEntry { path: String },

    #[error("Extract path {extract:?} not found in archive")]
    ExtractNotFound { extract: String },

    #[error("Failed to decode {encoding} artifact: {source}")]
    Decode {
        encoding: Encoding,
        #[source]
        source: std::io::Error,
    },
}

/// Artifact encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Identity,
    Zstd,
    TarGzip,
    TarXz,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "",
            Self::Zstd => "zstd",
            Self::TarGzip => "tar+gzip",
            Self::TarXz => "tar+xz",
        }
    }

    /// Whether the decoded stream is a tar archive
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::TarGzip | Self::TarXz)
    }
}

impl FromStr for Encoding {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Ok(Self::Identity),
            "zstd" => Ok(Self::Zstd),
            "tar+gzip" => Ok(Self::TarGzip),
            "tar+xz" => Ok(Self::TarXz),
            other => Err(ArchiveError::UnsupportedEncoding {
                encoding: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A regular file read from a tar stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Cleaned, slash-separated path relative to the archive root
    pub path: String,
    pub body: Vec<u8>,
    /// Permission bits from the tar header, `None` when zero
    pub mode: Option<u32>,
}

/// Result of decoding one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedArtifact {
    /// One output placed at the rule path
    Single { body: Vec<u8>, mode: Option<u32> },
    /// Several outputs placed underneath the rule path
    Multi(Vec<ArchiveEntry>),
}

/// Decode `artifact` according to `encoding`.
///
/// For archive encodings, `expand` yields every entry; otherwise `extract`
/// selects one member (single output) or one directory (multi output).
pub fn decode(
    artifact: &[u8],
    encoding: Encoding,
    extract: &str,
    expand: bool,
) -> Result<DecodedArtifact, ArchiveError> {
    match encoding {
        Encoding::Identity => Ok(DecodedArtifact::Single {
            body: artifact.to_vec(),
            mode: None,
        }),
        Encoding::Zstd => {
            let body = zstd::stream::decode_all(artifact)
                .map_err(|source| ArchiveError::Decode { encoding, source })?;
            Ok(DecodedArtifact::Single { body, mode: None })
        }
        Encoding::TarGzip | Encoding::TarXz => {
            let entries = read_entries(artifact, encoding)?;
            if expand {
                return Ok(DecodedArtifact::Multi(entries));
            }
            select(entries, extract)
        }
    }
}

/// Read every regular file from a compressed tar stream.
pub fn read_entries(artifact: &[u8], encoding: Encoding) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    match encoding {
        Encoding::TarGzip => read_tar(GzDecoder::new(artifact), encoding),
        Encoding::TarXz => read_tar(XzDecoder::new(artifact), encoding),
        other => Err(ArchiveError::UnsupportedEncoding {
            encoding: other.as_str().to_string(),
        }),
    }
}

fn read_tar<R: Read>(reader: R, encoding: Encoding) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let decode_err = |source| ArchiveError::Decode { encoding, source };

    let mut archive = tar::Archive::new(reader);
    let mut entries = Vec::new();

    for entry in archive.entries().map_err(decode_err)? {
        let mut entry = entry.map_err(decode_err)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let raw_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let path = normalize_entry_name(&raw_name)?;
        let mode = entry.header().mode().map_err(decode_err)? & 0o777;

        let mut body = Vec::new();
        entry.read_to_end(&mut body).map_err(decode_err)?;

        tracing::trace!(path = %path, size = body.len(), "Read archive entry");
        entries.push(ArchiveEntry {
            path,
            body,
            mode: (mode != 0).then_some(mode),
        });
    }

    Ok(entries)
}

/// Clean a tar entry name and reject names that leave the archive root.
pub fn normalize_entry_name(name: &str) -> Result<String, ArchiveError> {
    let cleaned = clean(&name.replace('\\', "/"));
    let cleaned = cleaned.strip_prefix("./").unwrap_or(&cleaned);

    if cleaned.is_empty() || cleaned == "." {
        return Err(ArchiveError::InvalidEntry {
            path: name.to_string(),
        });
    }
    if escapes_root(cleaned) {
        return Err(ArchiveError::PathEscape {
            path: name.to_string(),
        });
    }
    Ok(cleaned.to_string())
}

/// Clean an `extract` selector. Blank and `.` select nothing.
pub fn normalize_extract(extract: &str) -> Result<String, ArchiveError> {
    let value = extract.trim();
    let value = value.strip_prefix("./").unwrap_or(value);
    if value.is_empty() {
        return Ok(String::new());
    }

    let cleaned = clean(value);
    if cleaned == "." {
        return Ok(String::new());
    }
    if escapes_root(&cleaned) {
        return Err(ArchiveError::PathEscape {
            path: extract.to_string(),
        });
    }
    Ok(cleaned)
}

fn escapes_root(cleaned: &str) -> bool {
    cleaned.starts_with('/') || cleaned == ".." || cleaned.starts_with("../")
}

/// Pick the member or directory named by `extract`.
///
/// An exact path match wins; otherwise every entry under `extract/` is
/// returned with that prefix stripped.
pub fn select(mut entries: Vec<ArchiveEntry>, extract: &str) -> Result<DecodedArtifact, ArchiveError> {
    if let Some(index) = entries.iter().position(|entry| entry.path == extract) {
        let entry = entries.swap_remove(index);
        return Ok(DecodedArtifact::Single {
            body: entry.body,
            mode: entry.mode,
        });
    }

    let prefix = format!("{}/", extract);
    let children: Vec<ArchiveEntry> = entries
        .into_iter()
        .filter_map(|entry| {
            let relative = entry.path.strip_prefix(&prefix)?;
            if relative.is_empty() {
                return None;
            }
            Some(ArchiveEntry {
                path: relative.to_string(),
                body: entry.body,
                mode: entry.mode,
            })
        })
        .collect();

    if children.is_empty() {
        return Err(ArchiveError::ExtractNotFound {
            extract: extract.to_string(),
        });
    }
    Ok(DecodedArtifact::Multi(children))
}

/// Format permission bits the way rules spell them, e.g. `0755`.
pub fn format_mode(mode: u32) -> String {
    format!("{:04o}", mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn entry(path: &str, body: &str) -> ArchiveEntry {
        ArchiveEntry {
            path: path.to_string(),
            body: body.as_bytes().to_vec(),
            mode: Some(0o644),
        }
    }

    #[rstest]
    #[case("a.txt", "a.txt")]
    #[case("./a.txt", "a.txt")]
    #[case("dir/./b/../c.txt", "dir/c.txt")]
    #[case("dir//x", "dir/x")]
    fn test_normalize_entry_name_accepts(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_entry_name(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("a/../../b")]
    #[case("..")]
    #[case("/etc/passwd")]
    fn test_normalize_entry_name_rejects_escape(#[case] raw: &str) {
        assert!(matches!(
            normalize_entry_name(raw),
            Err(ArchiveError::PathEscape { .. })
        ));
    }

    #[test]
    fn test_normalize_entry_name_rejects_empty() {
        assert!(matches!(
            normalize_entry_name("./"),
            Err(ArchiveError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_normalize_extract() {
        assert_eq!(normalize_extract(" ./bin/tool ").unwrap(), "bin/tool");
        assert_eq!(normalize_extract(".").unwrap(), "");
        assert_eq!(normalize_extract("").unwrap(), "");
        assert!(normalize_extract("../x").is_err());
    }

    #[test]
    fn test_select_exact_match_is_single() {
        let entries = vec![entry("bin/tool", "T"), entry("README", "R")];
        let decoded = select(entries, "bin/tool").unwrap();
        assert_eq!(
            decoded,
            DecodedArtifact::Single {
                body: b"T".to_vec(),
                mode: Some(0o644)
            }
        );
    }

    #[test]
    fn test_select_directory_strips_prefix() {
        let entries = vec![
            entry("cfg/a.yml", "A"),
            entry("cfg/sub/b.yml", "B"),
            entry("cfgx/c.yml", "C"),
        ];
        let DecodedArtifact::Multi(children) = select(entries, "cfg").unwrap() else {
            panic!("expected multi output");
        };
        let paths: Vec<&str> = children.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.yml", "sub/b.yml"]);
    }

    #[test]
    fn test_select_missing_fails() {
        let entries = vec![entry("a", "A")];
        assert!(matches!(
            select(entries, "b"),
            Err(ArchiveError::ExtractNotFound { .. })
        ));
    }

    #[test]
    fn test_encoding_parse() {
        assert_eq!("".parse::<Encoding>().unwrap(), Encoding::Identity);
        assert_eq!(" TAR+GZIP ".parse::<Encoding>().unwrap(), Encoding::TarGzip);
        assert_eq!("tar+xz".parse::<Encoding>().unwrap(), Encoding::TarXz);
        assert!("zip".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_identity_decode_passes_bytes_through() {
        let decoded = decode(b"raw", Encoding::Identity, "", false).unwrap();
        assert_eq!(
            decoded,
            DecodedArtifact::Single {
                body: b"raw".to_vec(),
                mode: None
            }
        );
    }

    #[test]
    fn test_format_mode() {
        assert_eq!(format_mode(0o755), "0755");
        assert_eq!(format_mode(0o600), "0600");
    }
}
