//! Normalized sync configuration: sources, file rules and profiles

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Version written into configurations built by this crate
pub const SYNC_CONFIG_VERSION: &str = "1";

/// A downloadable resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Source {
    /// URL fetched with a single GET
    pub url: String,

    /// Request headers sent with the GET
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Source {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// One fetch-and-place operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRule {
    /// Id of the [`Source`] to fetch
    pub source: String,

    /// Destination, relative to the sync root unless absolute
    pub path: String,

    /// Octal permission string, e.g. `"0755"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// `overwrite`, `keep_local` or `three_way`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<String>,

    /// `none` or `timestamp`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,

    /// Checksum spec covering the raw downloaded bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_checksum: Option<String>,

    /// Checksum spec covering the bytes after decoding/extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_checksum: Option<String>,

    /// `""`, `zstd`, `tar+gzip` or `tar+xz`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub encoding: String,

    /// Archive member (file or directory) to place at `path`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extract: String,

    /// Expand every archive member underneath `path`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expand_archive: bool,
}

impl FileRule {
    pub fn new(source: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_merge(mut self, merge: impl Into<String>) -> Self {
        self.merge = Some(merge.into());
        self
    }

    pub fn with_backup(mut self, backup: impl Into<String>) -> Self {
        self.backup = Some(backup.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_extract(mut self, extract: impl Into<String>) -> Self {
        self.extract = extract.into();
        self
    }

    pub fn expanding(mut self) -> Self {
        self.expand_archive = true;
        self
    }

    pub fn with_download_checksum(mut self, spec: impl Into<String>) -> Self {
        self.download_checksum = Some(spec.into());
        self
    }

    pub fn with_output_checksum(mut self, spec: impl Into<String>) -> Self {
        self.output_checksum = Some(spec.into());
        self
    }
}

/// Named set of rules appended after the base rules when selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    #[serde(default)]
    pub files: Vec<FileRule>,
}

/// The normalized sync manifest consumed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub sources: BTreeMap<String, Source>,

    #[serde(default)]
    pub files: Vec<FileRule>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, Profile>,
}

fn default_version() -> String {
    SYNC_CONFIG_VERSION.to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            sources: BTreeMap::new(),
            files: Vec::new(),
            profiles: BTreeMap::new(),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, id: impl Into<String>, source: Source) -> Self {
        self.sources.insert(id.into(), source);
        self
    }

    pub fn with_file(mut self, rule: FileRule) -> Self {
        self.files.push(rule);
        self
    }

    pub fn with_profile(mut self, name: impl Into<String>, profile: Profile) -> Self {
        self.profiles.insert(name.into(), profile);
        self
    }

    /// Check the structural invariants: every source has a URL, every rule
    /// names a declared source and a destination, and no expanding rule
    /// carries an output checksum.
    pub fn validate(&self) -> Result<()> {
        for (id, source) in &self.sources {
            if source.url.trim().is_empty() {
                return Err(Error::validation(format!("source {:?} url is required", id)));
            }
        }

        for (index, rule) in self.files.iter().enumerate() {
            self.validate_rule(rule, &format!("files[{}]", index))?;
        }

        for (name, profile) in &self.profiles {
            for (index, rule) in profile.files.iter().enumerate() {
                self.validate_rule(rule, &format!("profiles.{}.files[{}]", name, index))?;
            }
        }

        Ok(())
    }

    fn validate_rule(&self, rule: &FileRule, location: &str) -> Result<()> {
        if rule.source.trim().is_empty() {
            return Err(Error::validation(format!("{}.source is required", location)));
        }
        if !self.sources.contains_key(&rule.source) {
            return Err(Error::validation(format!(
                "{}.source {:?} not found in sources",
                location, rule.source
            )));
        }
        if rule.path.trim().is_empty() {
            return Err(Error::validation(format!("{}.path is required", location)));
        }
        let has_output_checksum = rule
            .output_checksum
            .as_deref()
            .is_some_and(|spec| !spec.trim().is_empty());
        if rule.expand_archive && has_output_checksum {
            return Err(Error::validation(format!(
                "{}.output_checksum cannot be used with expand_archive",
                location
            )));
        }
        Ok(())
    }

    /// Rules to process for `profile`: the base rules followed by the
    /// profile's rules. `None` selects the base rules only.
    pub fn rules_for_profile(&self, profile: Option<&str>) -> Result<Vec<&FileRule>> {
        let mut rules: Vec<&FileRule> = self.files.iter().collect();

        if let Some(name) = profile.map(str::trim).filter(|name| !name.is_empty()) {
            let selected = self
                .profiles
                .get(name)
                .ok_or_else(|| Error::validation(format!("profile {:?} not found", name)))?;
            rules.extend(selected.files.iter());
        }

        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SyncConfig {
        SyncConfig::new()
            .with_source("tpl", Source::new("https://example.com/ci.yml"))
            .with_file(FileRule::new("tpl", "ci.yml"))
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_missing_source_url_rejected() {
        let config = base().with_source("empty", Source::new("  "));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("\"empty\" url is required"));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let config = base().with_file(FileRule::new("nope", "x.txt"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("files[1].source \"nope\" not found"));
    }

    #[test]
    fn test_missing_path_rejected() {
        let config = base().with_file(FileRule::new("tpl", ""));
        assert!(matches!(config.validate(), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_output_checksum_with_expand_rejected() {
        let config = base().with_file(
            FileRule::new("tpl", "out")
                .with_encoding("tar+gzip")
                .expanding()
                .with_output_checksum("sha256:00"),
        );
        assert!(matches!(config.validate(), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_profile_rules_are_appended() {
        let config = base().with_profile(
            "ci",
            Profile {
                files: vec![FileRule::new("tpl", "extra.yml")],
            },
        );

        let rules = config.rules_for_profile(Some("ci")).unwrap();
        let paths: Vec<&str> = rules.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["ci.yml", "extra.yml"]);

        assert_eq!(config.rules_for_profile(None).unwrap().len(), 1);
        assert!(config.rules_for_profile(Some("missing")).is_err());
    }

    #[test]
    fn test_profile_rules_are_validated() {
        let config = base().with_profile(
            "broken",
            Profile {
                files: vec![FileRule::new("ghost", "x")],
            },
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("profiles.broken.files[0]"));
    }
}
