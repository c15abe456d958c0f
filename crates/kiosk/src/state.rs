//! Shared server state: the image cache and the swappable slide library.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use imgcache::{CacheConfig, ImageCache};
use kioskconf::KioskConfig;
use slides::{LibraryHandle, LibrarySource, RenderableSlide, Resolver, TracingDiagnostics};

/// Client ID used when a request names none.
pub const DEFAULT_CLIENT: &str = "default";

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ImageCache>,
    pub library: Arc<LibraryHandle>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(cache: ImageCache, library: LibraryHandle) -> Self {
        Self {
            cache: Arc::new(cache),
            library: Arc::new(library),
            start_time: Instant::now(),
        }
    }

    /// Open the cache and load the library described by `config`.
    ///
    /// Blocks: the fallback library scan walks the whole photo root.
    pub fn from_config(config: &KioskConfig) -> Result<Self> {
        let cache = ImageCache::new(cache_config(config)).context("Failed to open image cache")?;
        let source = LibrarySource::new(&config.paths.library, &config.paths.photo_root)
            .with_cache_root(&config.paths.cache_root);
        let library = LibraryHandle::open(source, &TracingDiagnostics);
        Ok(Self::new(cache, library))
    }

    /// Resolve a playlist against the current library snapshot.
    ///
    /// Does image work synchronously; call from a blocking context.
    pub fn resolve(&self, client: &str) -> Vec<RenderableSlide> {
        let library = self.library.current();
        Resolver::new(&library, self.cache.as_ref(), &TracingDiagnostics).resolve(client)
    }
}

/// Image cache settings from the server configuration.
pub fn cache_config(config: &KioskConfig) -> CacheConfig {
    CacheConfig::new(&config.paths.photo_root, &config.paths.cache_root)
        .with_bounds(config.cache.max_width, config.cache.max_height)
        .with_jpeg_quality(config.cache.jpeg_quality)
}
