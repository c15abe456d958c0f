//! Slideshow server for photo kiosks.
//!
//! Wires the slide library and image cache to an axum router. The binary in
//! `main.rs` adds the CLI on top.

pub mod commands;
pub mod serve;
pub mod state;
pub mod telemetry;
pub mod web;

pub use state::{AppState, DEFAULT_CLIENT};
pub use web::{router, ApiError};
