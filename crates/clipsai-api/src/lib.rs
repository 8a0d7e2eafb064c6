//! Axum HTTP API server for ClipsAI.
//!
//! This crate provides:
//! - Manual and transcript-driven clip trimming backed by `clipsai-media`
//! - Range-aware streaming of uploads and rendered clips
//! - Security headers, request ids and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
