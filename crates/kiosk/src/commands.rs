//! One-shot CLI commands that don't start the server.

use anyhow::{Context, Result};
use kioskconf::{ConfigSources, KioskConfig};
use serde::Serialize;
use slides::Slideshow;
use tracing::info;

use crate::state::{AppState, DEFAULT_CLIENT};

/// Print the playlist for `client` as JSON. Warms the cache as a side effect.
pub fn resolve(config: &KioskConfig, client: &str, compact: bool) -> Result<()> {
    let state = AppState::from_config(config)?;
    let show = Slideshow {
        slides: state.resolve(client),
    };

    let json = if compact {
        serde_json::to_string(&show)
    } else {
        serde_json::to_string_pretty(&show)
    }
    .context("Failed to serialize playlist")?;

    println!("{}", json);
    Ok(())
}

#[derive(Debug, Serialize)]
struct WarmReport {
    clients: Vec<ClientReport>,
    cache: imgcache::CacheStats,
}

#[derive(Debug, Serialize)]
struct ClientReport {
    client: String,
    slides: usize,
}

/// Resolve every configured playlist so the cache is populated before clients ask.
pub fn warm(config: &KioskConfig) -> Result<()> {
    let state = AppState::from_config(config)?;
    let library = state.library.current();

    let mut clients = vec![DEFAULT_CLIENT.to_string()];
    clients.extend(
        library
            .client_ids()
            .into_iter()
            .filter(|id| *id != DEFAULT_CLIENT)
            .map(String::from),
    );

    let mut report = Vec::with_capacity(clients.len());
    for client in clients {
        let slides = state.resolve(&client).len();
        info!(client = %client, slides, "warmed playlist");
        report.push(ClientReport { client, slides });
    }

    let report = WarmReport {
        clients: report,
        cache: state.cache.stats(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );
    Ok(())
}

/// Print the effective configuration and where it came from.
pub fn show_config(config: &KioskConfig, sources: &ConfigSources) {
    if sources.files.is_empty() {
        println!("# No config files found, using defaults");
    }
    for file in &sources.files {
        println!("# Loaded: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# Env override: {}", var);
    }
    println!();
    print!("{}", config.to_toml());
}
