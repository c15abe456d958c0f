//! kiosk - slideshow server and CLI for photo kiosks
//!
//! Subcommands:
//! - `kiosk serve` - Run the HTTP server
//! - `kiosk resolve <client>` - Print a client's playlist as JSON
//! - `kiosk warm` - Pre-populate the image cache for every playlist
//! - `kiosk config` - Show the effective configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kioskconf::{loader, ConfigSources, KioskConfig};
use tracing::warn;

use kiosk::{commands, serve, telemetry};

#[derive(Parser)]
#[command(name = "kiosk")]
#[command(about = "Slideshow server and CLI for photo kiosks")]
#[command(version)]
struct Cli {
    /// Config file, replacing ./kiosk.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// HTTP port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the playlist for a client as JSON
    Resolve {
        /// Client identifier
        #[arg(default_value = "default")]
        client: String,

        /// Single-line output
        #[arg(long)]
        compact: bool,
    },

    /// Resolve every configured playlist to fill the cache
    Warm,

    /// Show effective configuration and its sources
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config file shouldn't keep a kiosk dark
    let loaded = KioskConfig::load_with_sources_from(cli.config.as_deref());
    let (mut config, sources, load_error) = match loaded {
        Ok((config, sources)) => (config, sources, None),
        Err(e) => {
            let mut config = KioskConfig::default();
            let mut sources = ConfigSources::default();
            loader::apply_env_overrides(&mut config, &mut sources);
            (config, sources, Some(e))
        }
    };

    telemetry::init(&config.telemetry.log_level)?;
    if let Some(e) = load_error {
        warn!(error = %e, "config unreadable, using defaults");
    }

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.bind.http_port = port;
            }
            if let Some(host) = host {
                config.bind.host = host;
            }
            serve::run(config).await?;
        }
        Commands::Resolve { client, compact } => {
            tokio::task::spawn_blocking(move || commands::resolve(&config, &client, compact))
                .await??;
        }
        Commands::Warm => {
            tokio::task::spawn_blocking(move || commands::warm(&config)).await??;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}
