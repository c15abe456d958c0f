//! Image cache configuration.
//!
//! Default paths:
//! - photo root: `~/Pictures/kiosk`
//! - cache root: `~/.cache/kiosk` (platform cache dir)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the image cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Read-only tree of source photos.
    pub photo_root: PathBuf,

    /// Mirror of `photo_root` holding display-ready copies.
    /// Only this tree is ever written.
    pub cache_root: PathBuf,

    /// Bounding box width; wider images are downscaled.
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Bounding box height; taller images are downscaled.
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Quality used when re-encoding JPEG output (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_max_width() -> u32 {
    1920
}

fn default_max_height() -> u32 {
    1080
}

fn default_jpeg_quality() -> u8 {
    90
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            photo_root: default_photo_root(),
            cache_root: default_cache_root(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Get the default photo root (~/Pictures/kiosk).
pub fn default_photo_root() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join("Pictures").join("kiosk"))
        .unwrap_or_else(|| PathBuf::from("photos"))
}

/// Get the default cache root (platform cache dir + `kiosk`).
pub fn default_cache_root() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.cache_dir().join("kiosk"))
        .unwrap_or_else(|| PathBuf::from(".cache/kiosk"))
}

impl CacheConfig {
    /// Create a config with explicit roots and default bounds.
    pub fn new(photo_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            photo_root: photo_root.into(),
            cache_root: cache_root.into(),
            ..Self::default()
        }
    }

    /// Override the bounding box.
    pub fn with_bounds(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// Override the JPEG quality, clamped to 1..=100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}
