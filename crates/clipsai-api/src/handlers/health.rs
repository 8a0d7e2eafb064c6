//! Health check handler.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub upload_dir: bool,
    pub port: u16,
    pub analyzer: &'static str,
    pub features: Features,
}

#[derive(Serialize)]
pub struct Features {
    pub precise_trimming: bool,
    pub aspect_conversion: bool,
    pub visual_analysis: bool,
    pub range_streaming: bool,
}

/// Health check endpoint (liveness probe).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        upload_dir: tokio::fs::try_exists(&state.config.upload_dir)
            .await
            .unwrap_or(false),
        port: state.config.port,
        analyzer: state.analyzer_name(),
        features: Features {
            precise_trimming: true,
            aspect_conversion: true,
            visual_analysis: state.visual_analysis(),
            range_streaming: true,
        },
    })
}
