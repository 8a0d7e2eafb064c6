//! Preloaded test video handler.

use axum::extract::State;
use axum::Json;

use clipsai_models::PreloadedVideoResponse;

use crate::state::AppState;

/// Info about the test video copied into the upload directory at startup.
///
/// A missing test video is not an HTTP error; the body says so instead.
pub async fn get_preloaded_video(State(state): State<AppState>) -> Json<PreloadedVideoResponse> {
    let response = match state.preloaded.as_deref() {
        Some(video) => PreloadedVideoResponse {
            success: true,
            video: Some(video.clone()),
            error: None,
        },
        None => PreloadedVideoResponse {
            success: false,
            video: None,
            error: Some("No preloaded video available".to_string()),
        },
    };
    Json(response)
}
