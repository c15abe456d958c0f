//! Layered configuration loading for the kiosk server.
//!
//! # Usage
//!
//! ```rust,no_run
//! use kioskconf::KioskConfig;
//!
//! let config = KioskConfig::load().expect("Failed to load config");
//!
//! println!("Photos: {}", config.paths.photo_root.display());
//! println!("HTTP: {}", config.bind.addr());
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/kiosk/config.toml` (system)
//! 2. `~/.config/kiosk/config.toml` (user)
//! 3. `./kiosk.toml` (local override, or the `--config` path)
//! 4. Environment variables (`KIOSK_*`, `RUST_LOG`)
//!
//! Files merge table by table, so a user file that only sets
//! `[paths] photo_root` keeps everything else from the system file.
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! photo_root = "~/Pictures/kiosk"
//! cache_root = "/var/cache/kiosk"
//! library = "~/.config/kiosk/slides.toml"
//! web_dir = "/usr/share/kiosk/web"
//!
//! [bind]
//! host = "0.0.0.0"
//! http_port = 8088
//!
//! [cache]
//! max_width = 1920
//! max_height = 1080
//! jpeg_quality = 90
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod infra;
pub mod loader;

pub use infra::{BindConfig, CacheSection, PathsConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete kiosk configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KioskConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub bind: BindConfig,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl KioskConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load with `config_path` replacing the local `./kiosk.toml` override.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        let mut sources = ConfigSources::default();
        let mut config = Self::from_files(&files)?;
        sources.files = files;

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Merge the given files in order over the compiled defaults. No env overlay.
    pub fn from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut merged = toml::Table::new();
        for path in files {
            loader::merge_tables(&mut merged, loader::load_table(path)?);
        }
        loader::from_table(merged)
    }

    /// Expand `~` and `$VAR` prefixes in every configured path.
    pub fn expand_paths(&mut self) {
        let expand = |p: &Path| loader::expand_path(&p.to_string_lossy());
        self.paths.photo_root = expand(&self.paths.photo_root);
        self.paths.cache_root = expand(&self.paths.cache_root);
        self.paths.library = expand(&self.paths.library);
        self.paths.web_dir = self.paths.web_dir.as_deref().map(expand);
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand for stable section order and a header
        let mut output = String::new();

        output.push_str("# Kiosk Configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!("photo_root = \"{}\"\n", self.paths.photo_root.display()));
        output.push_str(&format!("cache_root = \"{}\"\n", self.paths.cache_root.display()));
        output.push_str(&format!("library = \"{}\"\n", self.paths.library.display()));
        if let Some(web_dir) = &self.paths.web_dir {
            output.push_str(&format!("web_dir = \"{}\"\n", web_dir.display()));
        }

        output.push_str("\n[bind]\n");
        output.push_str(&format!("host = \"{}\"\n", self.bind.host));
        output.push_str(&format!("http_port = {}\n", self.bind.http_port));

        output.push_str("\n[cache]\n");
        output.push_str(&format!("max_width = {}\n", self.cache.max_width));
        output.push_str(&format!("max_height = {}\n", self.cache.max_height));
        output.push_str(&format!("jpeg_quality = {}\n", self.cache.jpeg_quality));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}
