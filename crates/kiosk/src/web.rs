//! HTTP surface for kiosk clients.
//!
//! - `GET /api/slideshow?client=<id>` resolved playlist
//! - `POST /api/reload` re-read the slide library
//! - `GET /health` status and cache counters
//! - `GET /cache/*`, `GET /photos/*` image files
//! - `GET /*` static client, when a web directory is configured

use std::path::Path;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use slides::{Slideshow, TracingDiagnostics};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::{AppState, DEFAULT_CLIENT};

/// Errors surfaced to HTTP callers as `{ "error": "..." }`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was understood but its effect was refused.
    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(%status, error = %self, "request failed");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState, web_dir: Option<&Path>) -> Router {
    let cache_files = ServeDir::new(&state.cache.config().cache_root);
    let photo_files = ServeDir::new(&state.cache.config().photo_root);

    let app = Router::new()
        .route("/api/slideshow", get(slideshow))
        .route("/api/reload", post(reload))
        .route("/health", get(health))
        .nest_service("/cache", cache_files)
        .nest_service("/photos", photo_files)
        .with_state(state);

    let app = match web_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Deserialize)]
pub struct SlideshowQuery {
    client: Option<String>,
}

async fn slideshow(
    State(state): State<AppState>,
    Query(query): Query<SlideshowQuery>,
) -> Result<Json<Slideshow>, ApiError> {
    let client = query
        .client
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CLIENT.to_string());

    let slides = tokio::task::spawn_blocking(move || state.resolve(&client))
        .await
        .map_err(|e| ApiError::Internal(format!("playlist resolution failed: {}", e)))?;

    Ok(Json(Slideshow { slides }))
}

async fn reload(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let result = tokio::task::spawn_blocking(move || state.library.reload(&TracingDiagnostics))
        .await
        .map_err(|e| ApiError::Internal(format!("reload task failed: {}", e)))?;

    let library = result.map_err(|e| ApiError::Unprocessable(e.to_string()))?;
    info!(slides = library.len(), "library reloaded over HTTP");

    Ok(Json(serde_json::json!({
        "status": "reloaded",
        "slides": library.len(),
    })))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed();

    Json(serde_json::json!({
        "status": "healthy",
        "uptime_secs": uptime.as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "slides": state.library.current().len(),
        "cache": state.cache.stats(),
    }))
}
