//! HTTP request and response bodies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::transcript::TranscriptSegment;

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

/// Manual trim request.
///
/// `aspect_ratio` is `"original"` to skip conversion, otherwise a target such
/// as `"16:9"` or `"9:16"`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct TrimClipRequest {
    #[validate(length(min = 1, max = 128))]
    pub video_id: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default = "default_aspect_ratio")]
    #[validate(length(max = 32))]
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrimClipResponse {
    pub success: bool,
    pub clip_url: String,
    pub clip_path: String,
    /// Effective start after clamping to the source duration
    pub start_time: f64,
    /// Effective end after clamping to the source duration
    pub end_time: f64,
    pub aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_confidence: Option<f64>,
}

/// Auto-clip request. The transcript comes from the transcription collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct FindClipsRequest {
    #[validate(length(min = 1, max = 128))]
    pub video_id: String,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

/// Result of generating one auto-clip.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedClip {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindClipsResponse {
    pub success: bool,
    pub clips: Vec<GeneratedClip>,
}

/// Test video copied into the upload directory at startup.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PreloadedVideo {
    pub filename: String,
    pub video_id: String,
    pub size: u64,
    pub url: String,
    pub preloaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PreloadedVideoResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<PreloadedVideo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
