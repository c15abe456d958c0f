//! Frame sequence expansion: glob pattern → ordered list of cached frames.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::pattern::Pattern;
use crate::relpath::RelPath;
use crate::store::ImageCache;

/// List every file under `root` as a relative path, sorted.
///
/// Symlinks are followed and unreadable entries skipped. Anything at or below
/// `skip` is left out, which keeps a cache root nested inside the photo root
/// from feeding its own copies back in.
pub fn scan_tree(root: &Path, skip: Option<&Path>) -> Vec<RelPath> {
    let mut paths = walk(root, root, skip);
    paths.sort();
    paths
}

fn walk(root: &Path, start: &Path, skip: Option<&Path>) -> Vec<RelPath> {
    if !start.is_dir() {
        return Vec::new();
    }

    WalkDir::new(start)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| skip.map_or(true, |s| !e.path().starts_with(s)))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| RelPath::from_path_under(e.path(), root).ok())
        .collect()
}

impl ImageCache {
    /// Relative paths of the frames a pattern selects, in frame order.
    ///
    /// Only the pattern's literal directory prefix is walked, so
    /// `timelapse/frame_*.jpg` never touches the rest of the photo root.
    pub fn frame_paths(&self, pattern: &str) -> Vec<RelPath> {
        let pattern = Pattern::new(pattern);
        if pattern.is_malformed() {
            debug!(pattern = pattern.as_str(), "malformed frame pattern");
            return Vec::new();
        }

        let root = &self.config().photo_root;
        let start = match pattern.literal_dir() {
            "" => root.clone(),
            dir => match RelPath::new(dir) {
                Ok(rel) => rel.join_to(root),
                Err(_) => return Vec::new(),
            },
        };

        let mut frames: Vec<RelPath> = walk(root, &start, Some(&self.config().cache_root))
            .into_iter()
            .filter(|rel| pattern.matches(rel.as_str()))
            .collect();
        frames.sort();
        frames
    }
}
