//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// Lexically clean a slash-separated path.
///
/// Drops empty and `.` segments and resolves `..` against the preceding
/// segment. A relative path keeps leading `..` segments so callers can tell
/// when it climbs out of its base; a rooted path cannot climb above `/`.
/// The empty path cleans to `.`.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// A path normalized to use forward slashes internally.
///
/// All paths are stored cleaned (see [`clean`]) with forward slashes and are
/// converted to platform-native form only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str.replace('\\', "/")),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment, resolving dot segments.
    ///
    /// The result may land outside `self`; use [`NormalizedPath::is_within`]
    /// when the segment comes from untrusted input.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        Self {
            inner: clean(&format!("{}/{}", self.inner, segment)),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(0) => None,
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        match self.inner.rsplit('/').next() {
            Some("") | Some(".") | Some("..") | None => None,
            Some(name) => Some(name),
        }
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Whether the path is absolute on this platform.
    pub fn is_absolute(&self) -> bool {
        self.inner.starts_with('/') || Path::new(&self.inner).is_absolute()
    }

    /// Whether this path equals `root` or lies underneath it.
    pub fn is_within(&self, root: &NormalizedPath) -> bool {
        if self.inner == root.inner {
            return true;
        }
        let prefix = if root.inner.ends_with('/') {
            root.inner.clone()
        } else {
            format!("{}/", root.inner)
        };
        self.inner.starts_with(&prefix)
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_keeps_leading_parent_segments_for_relative_paths() {
        assert_eq!(clean("../a"), "../a");
        assert_eq!(clean("a/../../b"), "../b");
        assert_eq!(clean("./a/./b/"), "a/b");
    }

    #[test]
    fn clean_cannot_climb_above_root() {
        assert_eq!(clean("/../etc/passwd"), "/etc/passwd");
        assert_eq!(clean("/"), "/");
    }

    #[test]
    fn clean_empty_is_dot() {
        assert_eq!(clean(""), ".");
        assert_eq!(clean("a/.."), ".");
    }

    #[test]
    fn parent_of_top_level_file_is_root() {
        let path = NormalizedPath::new("/file.txt");
        assert_eq!(path.parent().unwrap().as_str(), "/");
        assert!(NormalizedPath::new("/").parent().is_none());
    }
}
