//! The on-disk sync document
//!
//! A [`Manifest`] is what users write. Besides the explicit `sources`,
//! `files` and `profiles` sections it accepts a `repositories` shorthand:
//! a base URL plus a list of files, each expanded into one [`Source`] and
//! one [`FileRule`] by [`Manifest::into_sync_config`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tplsync_fs::digest::normalize_checksum;

use super::sync_config::{FileRule, Profile, SYNC_CONFIG_VERSION, Source, SyncConfig};
use crate::archive::{Encoding, normalize_extract};
use crate::{Error, Result};

fn default_version() -> String {
    SYNC_CONFIG_VERSION.to_string()
}

/// Parsed sync document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub sources: BTreeMap<String, Source>,

    #[serde(default)]
    pub files: Vec<FileRule>,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    /// Shorthand entries expanded after the explicit `files`
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: default_version(),
            sources: BTreeMap::new(),
            files: Vec::new(),
            profiles: BTreeMap::new(),
            repositories: Vec::new(),
        }
    }
}

/// A group of files downloaded from one base URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Repository {
    /// Free-form note, ignored
    #[serde(rename = "_comment", default, skip_serializing_if = "String::is_empty")]
    pub comment: String,

    pub url: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub files: Vec<RepositoryFile>,
}

/// One file under a [`Repository`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryFile {
    /// Path appended to the repository URL
    pub file_name: String,

    /// Destination directory; `$VAR` and `${VAR}` are expanded
    #[serde(default)]
    pub out_dir: String,

    /// Output file name, overriding the derived one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub encoding: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extract: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub download_digest: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_digest: String,

    /// Accepted by the schema but rejected during expansion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink: Option<SymlinkSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymlinkSpec {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub target: String,
}

impl Manifest {
    /// Build the normalized configuration, expanding `repositories`.
    ///
    /// Shorthand rules always carry `merge = "overwrite"` and
    /// `backup = "none"`; call-site overrides still apply on top.
    pub fn into_sync_config(self) -> Result<SyncConfig> {
        let mut config = SyncConfig {
            version: self.version,
            sources: self.sources,
            files: self.files,
            profiles: self.profiles,
        };

        for (repo_index, repo) in self.repositories.iter().enumerate() {
            if repo.url.trim().is_empty() {
                return Err(Error::validation(format!(
                    "repositories[{}].url is required",
                    repo_index
                )));
            }

            for (file_index, file) in repo.files.iter().enumerate() {
                let (id, source, rule) = expand_file(repo, file, repo_index, file_index)?;
                if config.sources.contains_key(&id) {
                    return Err(Error::validation(format!(
                        "repositories[{}].files[{}] source id {:?} is already declared",
                        repo_index, file_index, id
                    )));
                }
                config.sources.insert(id, source);
                config.files.push(rule);
            }
        }

        tracing::debug!(
            sources = config.sources.len(),
            files = config.files.len(),
            "Built sync configuration"
        );
        Ok(config)
    }
}

fn expand_file(
    repo: &Repository,
    file: &RepositoryFile,
    repo_index: usize,
    file_index: usize,
) -> Result<(String, Source, FileRule)> {
    let location = format!("repositories[{}].files[{}]", repo_index, file_index);

    if file.file_name.trim().is_empty() {
        return Err(Error::validation(format!("{}.file_name is required", location)));
    }
    if file.out_dir.trim().is_empty() {
        return Err(Error::validation(format!("{}.out_dir is required", location)));
    }
    if file.symlink.is_some() {
        return Err(Error::validation(format!("{}.symlink is not supported", location)));
    }

    let encoding: Encoding = file.encoding.parse().map_err(|_| {
        Error::validation(format!(
            "{}.encoding must be one of \"zstd\", \"tar+gzip\", \"tar+xz\"",
            location
        ))
    })?;

    let mut extract = file.extract.trim().to_string();
    if extract == "." {
        extract.clear();
    }
    if !extract.is_empty() && !encoding.is_archive() {
        return Err(Error::validation(format!(
            "{}.extract requires archive encoding",
            location
        )));
    }
    let extract = if encoding.is_archive() {
        normalize_extract(&extract)
            .map_err(|_| Error::validation(format!("{}.extract must stay within archive root", location)))?
    } else {
        String::new()
    };

    let expand_archive = encoding.is_archive() && extract.is_empty();
    let out_dir = expand_env(&file.out_dir);

    let path = if expand_archive {
        tplsync_fs::clean(&out_dir)
    } else {
        let name = match file.rename.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(rename) => rename.to_string(),
            None => derive_target_name(&file.file_name, encoding, &extract).ok_or_else(|| {
                Error::validation(format!("{} could not determine output filename", location))
            })?,
        };
        if name == "." || name == "/" {
            return Err(Error::validation(format!(
                "{} could not determine output filename",
                location
            )));
        }
        tplsync_fs::clean(&format!("{}/{}", out_dir, name))
    };

    let download_checksum = normalize_checksum(&file.download_digest)
        .map_err(|e| Error::validation(format!("{}.download_digest {}", location, e)))?;
    let output_checksum = normalize_checksum(&file.output_digest)
        .map_err(|e| Error::validation(format!("{}.output_digest {}", location, e)))?;

    if expand_archive && !output_checksum.is_empty() {
        return Err(Error::validation(format!(
            "{}.output_digest cannot be used when extract is omitted for archive encodings",
            location
        )));
    }

    let id = format!("r{}f{}", repo_index, file_index);
    let source = Source {
        url: join_url(&repo.url, &file.file_name),
        headers: repo.headers.clone(),
    };
    let rule = FileRule {
        source: id.clone(),
        path,
        mode: if expand_archive { None } else { file.mode.clone() },
        merge: Some("overwrite".to_string()),
        backup: Some("none".to_string()),
        download_checksum: Some(download_checksum).filter(|s| !s.is_empty()),
        output_checksum: Some(output_checksum).filter(|s| !s.is_empty()),
        encoding: encoding.as_str().to_string(),
        extract,
        expand_archive,
    };

    Ok((id, source, rule))
}

fn join_url(base: &str, file_name: &str) -> String {
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        file_name.trim().trim_start_matches('/')
    )
}

fn derive_target_name(file_name: &str, encoding: Encoding, extract: &str) -> Option<String> {
    if encoding.is_archive() {
        return base_name(extract);
    }
    let base = base_name(file_name)?;
    if encoding == Encoding::Zstd {
        for suffix in [".zst", ".zstd"] {
            if let Some(stripped) = base.strip_suffix(suffix) {
                return Some(stripped.to_string());
            }
        }
    }
    Some(base)
}

fn base_name(path: &str) -> Option<String> {
    let cleaned = tplsync_fs::clean(path.trim());
    match cleaned.rsplit('/').next() {
        None | Some("") | Some(".") => None,
        Some(name) => Some(name.to_string()),
    }
}

/// Expand `$VAR` and `${VAR}` references from the process environment.
///
/// Unset variables expand to the empty string. A `$` not followed by a
/// variable name is kept as is.
pub fn expand_env(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{')
            && let Some(end) = braced.find('}')
        {
            out.push_str(&std::env::var(&braced[..end]).unwrap_or_default());
            rest = &braced[end + 1..];
            continue;
        }

        let name_len = after
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(after.len());
        if name_len == 0 {
            out.push('$');
        } else {
            out.push_str(&std::env::var(&after[..name_len]).unwrap_or_default());
        }
        rest = &after[name_len..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_trims_slashes() {
        assert_eq!(
            join_url("https://example.com/base/", "/ci.yml"),
            "https://example.com/base/ci.yml"
        );
        assert_eq!(join_url(" https://x ", "a/b"), "https://x/a/b");
    }

    #[test]
    fn test_derive_target_name() {
        assert_eq!(
            derive_target_name("dl/tool.tar.gz", Encoding::TarGzip, "bin/tool").as_deref(),
            Some("tool")
        );
        assert_eq!(
            derive_target_name("cfg.yml.zst", Encoding::Zstd, "").as_deref(),
            Some("cfg.yml")
        );
        assert_eq!(
            derive_target_name("cfg.yml.zstd", Encoding::Zstd, "").as_deref(),
            Some("cfg.yml")
        );
        assert_eq!(
            derive_target_name("a/b/ci.yml", Encoding::Identity, "").as_deref(),
            Some("ci.yml")
        );
    }

    #[test]
    fn test_expand_env_forms() {
        // SAFETY: test-only variable with a unique name
        unsafe { std::env::set_var("TPLSYNC_MANIFEST_TEST_DIR", "/opt/tpl") };

        assert_eq!(expand_env("$TPLSYNC_MANIFEST_TEST_DIR/ci"), "/opt/tpl/ci");
        assert_eq!(expand_env("${TPLSYNC_MANIFEST_TEST_DIR}x"), "/opt/tplx");
        assert_eq!(expand_env("a/$TPLSYNC_MANIFEST_TEST_UNSET/b"), "a//b");
        assert_eq!(expand_env("cost$"), "cost$");
        assert_eq!(expand_env("no vars"), "no vars");
    }

    #[test]
    fn test_symlink_rejected() {
        let manifest = Manifest {
            repositories: vec![Repository {
                url: "https://example.com".into(),
                files: vec![RepositoryFile {
                    file_name: "a".into(),
                    out_dir: "out".into(),
                    symlink: Some(SymlinkSpec::default()),
                    ..RepositoryFile::default()
                }],
                ..Repository::default()
            }],
            ..Manifest::default()
        };
        let err = manifest.into_sync_config().unwrap_err();
        assert!(err.to_string().contains("symlink is not supported"));
    }
}
