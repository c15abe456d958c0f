//! HTTP server lifecycle.

use anyhow::{Context, Result};
use kioskconf::KioskConfig;
use tracing::{info, warn};

use crate::state::AppState;
use crate::web;

/// Run the slideshow server until SIGINT/SIGTERM.
pub async fn run(config: KioskConfig) -> Result<()> {
    info!("kiosk server starting");
    info!("   Photos: {}", config.paths.photo_root.display());
    info!("   Cache: {}", config.paths.cache_root.display());
    info!("   Library: {}", config.paths.library.display());

    let startup_config = config.clone();
    let state = tokio::task::spawn_blocking(move || AppState::from_config(&startup_config))
        .await
        .context("Startup task failed")??;

    let app = web::router(state, config.paths.web_dir.as_deref());

    let addr = config.bind.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("kiosk ready");
    info!("   Slideshow: GET http://{}/api/slideshow?client=<id>", addr);
    info!("   Reload: POST http://{}/api/reload", addr);
    info!("   Health: GET http://{}/health", addr);
    if let Some(web_dir) = &config.paths.web_dir {
        info!("   Client: http://{}/ from {}", addr, web_dir.display());
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
