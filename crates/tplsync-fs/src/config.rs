//! Format-agnostic document loading

use crate::{Error, NormalizedPath, Result, io};
use serde::de::DeserializeOwned;

/// Format-agnostic document store.
///
/// Detects the format from the file extension and handles
/// deserialization transparently.
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load a document from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let content = io::read_text(path)?;
        let extension = path.extension().unwrap_or("");
        Self::parse(path, extension, &content)
    }

    /// Parse document text, choosing the format from `extension`.
    pub fn parse<T: DeserializeOwned>(
        path: &NormalizedPath,
        extension: &str,
        content: &str,
    ) -> Result<T> {
        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "TOML".into(),
                message: e.to_string(),
            }),
            "json" => serde_json::from_str(content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "JSON".into(),
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "YAML".into(),
                message: e.to_string(),
            }),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }
}
