//! Library file loading, photo-root fallback, and the reload-and-swap handle.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{info, warn};

use crate::diagnostics::Diagnostics;
use crate::library::Library;
use crate::model::{LibraryConfig, SlideDefinition};

/// Images picked up when no library file is usable.
pub const IMAGE_PATTERNS: &[&str] = &[
    "**/*.jpg",
    "**/*.jpeg",
    "**/*.png",
    "**/*.gif",
    "**/*.webp",
    "**/*.JPG",
    "**/*.JPEG",
    "**/*.PNG",
    "**/*.GIF",
    "**/*.WEBP",
];

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read library {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse library {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Decode a library file. `.json` files are JSON, everything else TOML.
pub fn load_library_file(path: &Path) -> Result<LibraryConfig, LibraryError> {
    let contents = std::fs::read_to_string(path).map_err(|e| LibraryError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        serde_json::from_str(&contents).map_err(|e| e.to_string())
    } else {
        toml::from_str(&contents).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| LibraryError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// One still slide per image under `photo_root`, IDs equal to relative paths.
pub fn scan_library(photo_root: &Path, skip: Option<&Path>) -> LibraryConfig {
    let files = imgcache::scan_tree(photo_root, skip);
    let slides = imgcache::filter_directory(files.as_slice(), IMAGE_PATTERNS)
        .into_iter()
        .map(|rel| SlideDefinition {
            kind: Some("still".to_string()),
            ..SlideDefinition::with_file(rel.clone(), rel)
        })
        .collect();

    LibraryConfig {
        slides,
        ..LibraryConfig::default()
    }
}

/// Where a library comes from.
#[derive(Debug, Clone)]
pub struct LibrarySource {
    pub path: PathBuf,
    pub photo_root: PathBuf,
    /// Left out of the fallback scan when nested inside `photo_root`.
    pub cache_root: Option<PathBuf>,
}

impl LibrarySource {
    pub fn new(path: impl Into<PathBuf>, photo_root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            photo_root: photo_root.into(),
            cache_root: None,
        }
    }

    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(cache_root.into());
        self
    }

    /// Read and validate the library file.
    pub fn load(&self, diagnostics: &dyn Diagnostics) -> Result<Library, LibraryError> {
        let config = load_library_file(&self.path)?;
        Ok(Library::from_config(config, diagnostics))
    }

    /// Like [`load`](Self::load), but a missing or broken file yields a
    /// library synthesized from the photo root instead of an error.
    pub fn load_or_scan(&self, diagnostics: &dyn Diagnostics) -> Library {
        match self.load(diagnostics) {
            Ok(library) => library,
            Err(e) => {
                warn!(
                    error = %e,
                    root = %self.photo_root.display(),
                    "library unavailable, scanning photo root"
                );
                let config = scan_library(&self.photo_root, self.cache_root.as_deref());
                Library::from_config(config, diagnostics)
            }
        }
    }
}

/// Shared, swappable library. Readers get an immutable snapshot.
#[derive(Debug)]
pub struct LibraryHandle {
    source: LibrarySource,
    current: RwLock<Arc<Library>>,
}

impl LibraryHandle {
    /// Load the initial library, falling back to a photo-root scan.
    pub fn open(source: LibrarySource, diagnostics: &dyn Diagnostics) -> Self {
        let library = source.load_or_scan(diagnostics);
        info!(slides = library.len(), path = %source.path.display(), "slide library loaded");
        Self {
            source,
            current: RwLock::new(Arc::new(library)),
        }
    }

    pub fn source(&self) -> &LibrarySource {
        &self.source
    }

    /// The library requests should resolve against right now.
    pub fn current(&self) -> Arc<Library> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-read the library file and swap it in.
    ///
    /// On failure the previous library stays active.
    pub fn reload(&self, diagnostics: &dyn Diagnostics) -> Result<Arc<Library>, LibraryError> {
        let library = Arc::new(self.source.load(diagnostics)?);
        self.replace(Arc::clone(&library));
        info!(slides = library.len(), "slide library reloaded");
        Ok(library)
    }

    /// Install a library directly.
    pub fn replace(&self, library: Arc<Library>) {
        match self.current.write() {
            Ok(mut guard) => *guard = library,
            Err(poisoned) => *poisoned.into_inner() = library,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnostics;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_toml_and_json() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let toml_path = dir.path().join("slides.toml");
        fs::write(&toml_path, "[[slides]]\nid = \"a\"\nfile = \"a.jpg\"\n")?;
        let json_path = dir.path().join("slides.JSON");
        fs::write(&json_path, r#"{"slides": [{"id": "b", "type": "blank"}]}"#)?;

        assert_eq!(load_library_file(&toml_path)?.slides[0].id, "a");
        assert_eq!(load_library_file(&json_path)?.slides[0].kind.as_deref(), Some("blank"));
        Ok(())
    }

    #[test]
    fn test_parse_error_names_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("slides.toml");
        fs::write(&path, "[[slides]\nid = ")?;

        let err = load_library_file(&path).unwrap_err();
        assert!(matches!(err, LibraryError::Parse { .. }));
        assert!(err.to_string().contains("slides.toml"));
        Ok(())
    }

    #[test]
    fn test_scan_library_finds_images() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let photos = dir.path().join("photos");
        fs::create_dir_all(photos.join("trips"))?;
        fs::create_dir_all(photos.join(".cache"))?;
        fs::write(photos.join("b.JPG"), b"x")?;
        fs::write(photos.join("trips/a.png"), b"x")?;
        fs::write(photos.join("notes.txt"), b"x")?;
        fs::write(photos.join(".cache/b.JPG"), b"x")?;

        let config = scan_library(&photos, Some(&photos.join(".cache")));
        let ids: Vec<&str> = config.slides.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b.JPG", "trips/a.png"]);
        assert_eq!(config.slides[1].file.as_deref(), Some("trips/a.png"));
        Ok(())
    }

    #[test]
    fn test_reload_keeps_old_library_on_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("slides.toml");
        fs::write(&path, "[[slides]]\nid = \"a\"\nfile = \"a.jpg\"\n")?;
        let diag = CollectingDiagnostics::new();
        let handle = LibraryHandle::open(LibrarySource::new(&path, dir.path()), &diag);
        assert!(handle.current().get("a").is_some());

        fs::write(&path, "not = [valid")?;
        assert!(handle.reload(&diag).is_err());
        assert!(handle.current().get("a").is_some());

        fs::write(&path, "[[slides]]\nid = \"b\"\nfile = \"b.jpg\"\n")?;
        let snapshot = handle.current();
        handle.reload(&diag)?;
        assert!(handle.current().get("b").is_some());
        // Earlier snapshots are unaffected by the swap
        assert!(snapshot.get("a").is_some());
        Ok(())
    }

    #[test]
    fn test_missing_file_falls_back_to_scan() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("only.jpg"), b"x")?;

        let source = LibrarySource::new(dir.path().join("absent.toml"), dir.path());
        let handle = LibraryHandle::open(source, &CollectingDiagnostics::new());
        assert_eq!(handle.current().len(), 1);
        assert!(handle.current().get("only.jpg").is_some());
        Ok(())
    }
}
