//! Logging initialization.
//!
//! Logs go to stderr so `kiosk resolve` can print JSON on stdout.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `filter` is an `EnvFilter` directive string such as `info` or
/// `info,imgcache=debug`. An unparseable filter falls back to `info`.
pub fn init(filter: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
