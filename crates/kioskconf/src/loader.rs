//! Config file discovery, table merging, and environment variable overlay.

use crate::{ConfigError, KioskConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/kiosk/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("kiosk/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("kiosk.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a config file as a raw TOML table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_table(&contents, path)
}

fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Deep-merge `overlay` into `base`. Nested tables merge key by key;
/// any other value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Turn a merged table into a config, filling gaps with defaults.
pub fn from_table(table: toml::Table) -> Result<KioskConfig, ConfigError> {
    let mut config: KioskConfig = toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Invalid(e.to_string()))?;
    config.expand_paths();
    Ok(config)
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut KioskConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides using an arbitrary variable lookup.
pub fn apply_overrides_from<F>(config: &mut KioskConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut note = |key: &str| sources.env_overrides.push(key.to_string());

    // Paths
    if let Some(v) = lookup("KIOSK_PHOTO_ROOT") {
        config.paths.photo_root = expand_path(&v);
        note("KIOSK_PHOTO_ROOT");
    }
    if let Some(v) = lookup("KIOSK_CACHE_ROOT") {
        config.paths.cache_root = expand_path(&v);
        note("KIOSK_CACHE_ROOT");
    }
    if let Some(v) = lookup("KIOSK_LIBRARY") {
        config.paths.library = expand_path(&v);
        note("KIOSK_LIBRARY");
    }
    if let Some(v) = lookup("KIOSK_WEB_DIR") {
        config.paths.web_dir = Some(expand_path(&v));
        note("KIOSK_WEB_DIR");
    }

    // Bind address
    if let Some(v) = lookup("KIOSK_HTTP_HOST") {
        config.bind.host = v;
        note("KIOSK_HTTP_HOST");
    }
    if let Some(port) = lookup("KIOSK_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.bind.http_port = port;
        note("KIOSK_HTTP_PORT");
    }

    // Cache bounds
    if let Some(w) = lookup("KIOSK_MAX_WIDTH").and_then(|v| v.parse().ok()) {
        config.cache.max_width = w;
        note("KIOSK_MAX_WIDTH");
    }
    if let Some(h) = lookup("KIOSK_MAX_HEIGHT").and_then(|v| v.parse().ok()) {
        config.cache.max_height = h;
        note("KIOSK_MAX_HEIGHT");
    }
    if let Some(q) = lookup("KIOSK_JPEG_QUALITY").and_then(|v| v.parse().ok()) {
        config.cache.jpeg_quality = q;
        note("KIOSK_JPEG_QUALITY");
    }

    // Telemetry
    if let Some(v) = lookup("KIOSK_LOG_LEVEL") {
        config.telemetry.log_level = v;
        note("KIOSK_LOG_LEVEL");
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        note("RUST_LOG");
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
