//! Client-servable references to cached or original images.
//!
//! The kiosk client fetches images by URL path. The static file layer serves
//! `/cache/...` from the cache root and `/photos/...` from the photo root.

use crate::relpath::RelPath;
use serde::{Serialize, Serializer};
use std::fmt;

/// URL prefix for cache-root files.
pub const CACHE_PREFIX: &str = "/cache";

/// URL prefix for photo-root files.
pub const PHOTOS_PREFIX: &str = "/photos";

/// Where an image reference points.
///
/// Serializes as its URL path string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServableRef {
    /// A display-ready copy under the cache root.
    Cached(RelPath),
    /// The untouched source, used when caching failed.
    Original(RelPath),
}

impl ServableRef {
    /// Relative path shared by the source and the cached copy.
    pub fn rel_path(&self) -> &RelPath {
        match self {
            Self::Cached(p) | Self::Original(p) => p,
        }
    }

    /// Whether this points at the cache root.
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }

    /// Render the URL path, e.g. `/cache/trips/a.jpg`.
    pub fn url(&self) -> String {
        let prefix = match self {
            Self::Cached(_) => CACHE_PREFIX,
            Self::Original(_) => PHOTOS_PREFIX,
        };
        format!("{}/{}", prefix, self.rel_path())
    }
}

impl fmt::Display for ServableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

impl Serialize for ServableRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let rel = RelPath::new("trips\\2019\\a.jpg").unwrap();
        assert_eq!(ServableRef::Cached(rel.clone()).url(), "/cache/trips/2019/a.jpg");
        assert_eq!(ServableRef::Original(rel).to_string(), "/photos/trips/2019/a.jpg");
    }

    #[test]
    fn test_serializes_as_string() {
        let r = ServableRef::Cached(RelPath::new("a.jpg").unwrap());
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"/cache/a.jpg\"");
        assert!(r.is_cached());
    }
}
