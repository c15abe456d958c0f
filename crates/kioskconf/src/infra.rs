//! Configuration sections. Everything here is fixed for the life of the process.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Read-only tree of source photos.
    /// Default: ~/Pictures/kiosk
    #[serde(default = "PathsConfig::default_photo_root")]
    pub photo_root: PathBuf,

    /// Where resized copies are written, mirroring `photo_root`.
    /// Default: ~/.cache/kiosk
    #[serde(default = "PathsConfig::default_cache_root")]
    pub cache_root: PathBuf,

    /// Slide library file (TOML, or JSON by extension).
    /// Default: ~/.config/kiosk/slides.toml
    #[serde(default = "PathsConfig::default_library")]
    pub library: PathBuf,

    /// Static client files served at `/`. Unset means no client is served.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_dir: Option<PathBuf>,
}

impl PathsConfig {
    fn default_photo_root() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join("Pictures/kiosk"))
            .unwrap_or_else(|| PathBuf::from("photos"))
    }

    fn default_cache_root() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.cache_dir().join("kiosk"))
            .unwrap_or_else(|| PathBuf::from(".cache/kiosk"))
    }

    fn default_library() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("kiosk/slides.toml"))
            .unwrap_or_else(|| PathBuf::from("slides.toml"))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            photo_root: Self::default_photo_root(),
            cache_root: Self::default_cache_root(),
            library: Self::default_library(),
            web_dir: None,
        }
    }
}

/// HTTP bind address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindConfig {
    /// Default: 0.0.0.0
    #[serde(default = "BindConfig::default_host")]
    pub host: String,

    /// Default: 8088
    #[serde(default = "BindConfig::default_http_port")]
    pub http_port: u16,
}

impl BindConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_http_port() -> u16 {
        8088
    }

    /// `host:port` for the listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            http_port: Self::default_http_port(),
        }
    }
}

/// Image cache bounds and encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSection {
    /// Default: 1920
    #[serde(default = "CacheSection::default_max_width")]
    pub max_width: u32,

    /// Default: 1080
    #[serde(default = "CacheSection::default_max_height")]
    pub max_height: u32,

    /// JPEG re-encode quality, 1-100.
    /// Default: 90
    #[serde(default = "CacheSection::default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl CacheSection {
    fn default_max_width() -> u32 {
        1920
    }

    fn default_max_height() -> u32 {
        1080
    }

    fn default_jpeg_quality() -> u8 {
        90
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_width: Self::default_max_width(),
            max_height: Self::default_max_height(),
            jpeg_quality: Self::default_jpeg_quality(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or `EnvFilter` directive string.
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
