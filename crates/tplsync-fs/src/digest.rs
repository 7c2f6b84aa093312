//! Content digests and `algo:hex` checksum specs
//!
//! A checksum spec names an algorithm and the expected lowercase hex digest,
//! e.g. `sha256:b94d27b9...`. Specs are case-insensitive and surrounding
//! whitespace is ignored. The empty spec means "no verification".

use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Errors produced while parsing or verifying a checksum spec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    #[error("invalid checksum format {value:?}: expected blake3:<hex>, sha256:<hex> or md5:<hex>")]
    Format { value: String },

    #[error("invalid checksum hex {value:?}")]
    Hex { value: String },

    #[error("unsupported checksum algorithm {algorithm:?}")]
    Algorithm { algorithm: String },

    #[error("checksum mismatch ({algorithm}): expected {expected}, got {actual}")]
    Mismatch {
        algorithm: DigestAlgorithm,
        expected: String,
        actual: String,
    },
}

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Blake3,
    Sha256,
    Md5,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
            Self::Md5 => "md5",
        }
    }

    /// Compute the lowercase hex digest of `content`.
    pub fn hex_digest(&self, content: &[u8]) -> String {
        match self {
            Self::Blake3 => blake3::hash(content).to_hex().to_string(),
            Self::Sha256 => hex::encode(Sha256::digest(content)),
            Self::Md5 => hex::encode(Md5::digest(content)),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blake3" => Ok(Self::Blake3),
            "sha256" => Ok(Self::Sha256),
            "md5" => Ok(Self::Md5),
            other => Err(DigestError::Algorithm {
                algorithm: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `algo:hex` checksum spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumSpec {
    pub algorithm: DigestAlgorithm,
    /// Expected digest, lowercase hex
    pub digest: String,
}

impl ChecksumSpec {
    /// Parse a checksum spec.
    ///
    /// Returns `Ok(None)` for a blank spec.
    pub fn parse(value: &str) -> Result<Option<Self>, DigestError> {
        let raw = value.trim().to_lowercase();
        if raw.is_empty() {
            return Ok(None);
        }

        let (algorithm, digest) = raw
            .split_once(':')
            .map(|(a, d)| (a.trim(), d.trim()))
            .filter(|(a, d)| !a.is_empty() && !d.is_empty())
            .ok_or_else(|| DigestError::Format {
                value: value.to_string(),
            })?;

        let algorithm: DigestAlgorithm = algorithm.parse()?;
        if hex::decode(digest).is_err() {
            return Err(DigestError::Hex {
                value: value.to_string(),
            });
        }

        Ok(Some(Self {
            algorithm,
            digest: digest.to_string(),
        }))
    }

    /// Verify `content` against this spec.
    pub fn verify(&self, content: &[u8]) -> Result<(), DigestError> {
        let actual = self.algorithm.hex_digest(content);
        if actual == self.digest {
            Ok(())
        } else {
            Err(DigestError::Mismatch {
                algorithm: self.algorithm,
                expected: self.digest.clone(),
                actual,
            })
        }
    }
}

impl fmt::Display for ChecksumSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}

/// Verify `content` against a checksum spec string. A blank spec passes.
pub fn verify_checksum(content: &[u8], spec: &str) -> Result<(), DigestError> {
    match ChecksumSpec::parse(spec)? {
        Some(parsed) => parsed.verify(content),
        None => Ok(()),
    }
}

/// Normalize a checksum spec to its canonical lowercase `algo:hex` form.
///
/// A blank spec normalizes to the empty string.
pub fn normalize_checksum(spec: &str) -> Result<String, DigestError> {
    Ok(ChecksumSpec::parse(spec)?
        .map(|parsed| parsed.to_string())
        .unwrap_or_default())
}

/// SHA-256 hex digest, the content identity used for change detection.
pub fn sha256_hex(content: &[u8]) -> String {
    DigestAlgorithm::Sha256.hex_digest(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_value() {
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn md5_known_value() {
        assert_eq!(
            DigestAlgorithm::Md5.hex_digest(b"hello world"),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn blank_spec_parses_to_none() {
        assert_eq!(ChecksumSpec::parse("").unwrap(), None);
        assert_eq!(ChecksumSpec::parse("   ").unwrap(), None);
    }

    #[test]
    fn spec_is_case_insensitive() {
        let spec = ChecksumSpec::parse("SHA256:ABCDEF").unwrap().unwrap();
        assert_eq!(spec.algorithm, DigestAlgorithm::Sha256);
        assert_eq!(spec.digest, "abcdef");
        assert_eq!(spec.to_string(), "sha256:abcdef");
    }

    #[test]
    fn normalize_blank_is_empty() {
        assert_eq!(normalize_checksum("").unwrap(), "");
        assert_eq!(normalize_checksum(" MD5:00FF ").unwrap(), "md5:00ff");
    }
}
