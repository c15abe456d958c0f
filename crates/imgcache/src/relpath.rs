//! RelPath: a normalized, forward-slash path relative to the photo root.
//!
//! Relative paths are the cache key, so two spellings of the same file
//! (`a\b.jpg`, `./a/b.jpg`, `a//b.jpg`) must collapse to one key. Absolute
//! paths and `..` traversal are rejected so a slide can never reach outside
//! the photo root.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// A validated path relative to the photo (and cache) root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelPath(String);

/// Errors that can occur when normalizing a relative path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path must be relative: {0}")]
    Absolute(String),

    #[error("path must not contain '..': {0}")]
    Traversal(String),

    #[error("path must contain a file name")]
    Empty,

    #[error("{path} is not under {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

impl RelPath {
    /// Normalize an authored path string.
    ///
    /// Backslashes become `/`, empty and `.` segments are dropped.
    pub fn new(source: &str) -> Result<Self, PathError> {
        let s = source.replace('\\', "/");
        if s.starts_with('/') || has_drive_prefix(&s) {
            return Err(PathError::Absolute(source.to_string()));
        }

        let mut out = Vec::<&str>::new();
        for part in s.split('/') {
            if part.is_empty() || part == "." {
                continue;
            }
            if part == ".." {
                return Err(PathError::Traversal(source.to_string()));
            }
            out.push(part);
        }

        if out.is_empty() {
            return Err(PathError::Empty);
        }

        Ok(Self(out.join("/")))
    }

    /// Compute the relative path of `path` under `root`.
    pub fn from_path_under(path: &Path, root: &Path) -> Result<Self, PathError> {
        let stripped = path.strip_prefix(root).map_err(|_| PathError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

        let parts: Vec<String> = stripped
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        Self::new(&parts.join("/"))
    }

    /// Resolve against a root directory using host separators.
    pub fn join_to(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }

    /// Get the path as a forward-slash string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RelPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RelPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<RelPath> for String {
    fn from(p: RelPath) -> Self {
        p.0
    }
}

impl AsRef<str> for RelPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_normalization() {
        assert_eq!(RelPath::new("a/b.jpg").unwrap().as_str(), "a/b.jpg");
        assert_eq!(RelPath::new("a\\b.jpg").unwrap().as_str(), "a/b.jpg");
        assert_eq!(RelPath::new("./a//b.jpg").unwrap().as_str(), "a/b.jpg");
    }

    #[test]
    fn test_rejects_escapes() {
        assert!(matches!(RelPath::new("../x.jpg"), Err(PathError::Traversal(_))));
        assert!(matches!(RelPath::new("a/../../x.jpg"), Err(PathError::Traversal(_))));
        assert!(matches!(RelPath::new("/abs.jpg"), Err(PathError::Absolute(_))));
        assert!(matches!(RelPath::new("C:\\x.jpg"), Err(PathError::Absolute(_))));
        assert_eq!(RelPath::new("./"), Err(PathError::Empty));
    }

    #[test]
    fn test_from_path_under_root() {
        let root = Path::new("/srv/photos");
        let rel = RelPath::from_path_under(Path::new("/srv/photos/trips/a.jpg"), root).unwrap();
        assert_eq!(rel.as_str(), "trips/a.jpg");
        assert_eq!(rel.file_name(), "a.jpg");

        let err = RelPath::from_path_under(Path::new("/elsewhere/a.jpg"), root).unwrap_err();
        assert!(err.to_string().contains("not under"));
    }

    #[test]
    fn test_join_to_mirrors_structure() {
        let rel = RelPath::new("trips/2019/a.jpg").unwrap();
        let joined = rel.join_to(Path::new("/cache"));
        assert_eq!(joined, Path::new("/cache").join("trips").join("2019").join("a.jpg"));
    }

    #[test]
    fn test_serde_validates() {
        let ok: RelPath = serde_json::from_str("\"a\\\\b.png\"").unwrap();
        assert_eq!(ok.as_str(), "a/b.png");
        assert!(serde_json::from_str::<RelPath>("\"../escape.png\"").is_err());
    }
}
