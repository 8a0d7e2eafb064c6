//! Clip trimming handlers.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use axum::extract::State;
use axum::Json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use clipsai_media::{
    select_candidates, AutoClipJob, ClipJob, MediaError, MAX_AUTO_CLIPS, NO_SPEECH_THRESHOLD,
};
use clipsai_models::{
    AspectRequest, FindClipsRequest, FindClipsResponse, GeneratedClip, TimeWindow,
    TrimClipRequest, TrimClipResponse,
};

use crate::error::{ApiError, ApiResult};
use crate::state::{find_upload, AppState};

/// Reject ids that could escape the upload directory.
fn validate_video_id(video_id: &str) -> ApiResult<()> {
    if video_id.contains("..") || video_id.contains('/') || video_id.contains('\\') {
        return Err(ApiError::bad_request("Invalid video id"));
    }
    Ok(())
}

async fn locate_video(state: &AppState, video_id: &str) -> ApiResult<PathBuf> {
    validate_video_id(video_id)?;
    find_upload(&state.config.upload_dir, video_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Video {video_id} not found")))
}

/// Public URL of a file in the download directory.
fn download_url(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("/downloads/{name}")
}

/// Trim one clip and optionally convert its aspect ratio.
pub async fn trim_clip(
    State(state): State<AppState>,
    Json(request): Json<TrimClipRequest>,
) -> ApiResult<Json<TrimClipResponse>> {
    request.validate()?;

    let window =
        TimeWindow::new(request.start_time, request.end_time).map_err(MediaError::from)?;
    let aspect = AspectRequest::from_str(&request.aspect_ratio).unwrap_or_default();
    let input = locate_video(&state, &request.video_id).await?;

    let id = Uuid::new_v4();
    let job = ClipJob {
        input,
        output: state.config.download_dir.join(format!("clip_{id}.mp4")),
        scratch: state.config.temp_dir.join(format!("temp_{id}.mp4")),
        window,
        aspect,
    };

    let rendered = state.engine.render_clip(&job).await?;

    info!(
        video_id = %request.video_id,
        window = %rendered.window,
        aspect = %rendered.aspect,
        output = %rendered.path.display(),
        "Trimmed clip"
    );

    Ok(Json(TrimClipResponse {
        success: true,
        clip_url: download_url(&rendered.path),
        clip_path: rendered.path.to_string_lossy().to_string(),
        start_time: rendered.window.start,
        end_time: rendered.window.end,
        aspect_ratio: rendered.aspect.to_string(),
        focal_confidence: rendered.focal_point.map(|f| f.confidence),
    }))
}

/// Trim the speech segments of a transcript into clips.
///
/// Every candidate gets an entry; failed ones carry an error instead of a URL.
pub async fn find_clips(
    State(state): State<AppState>,
    Json(request): Json<FindClipsRequest>,
) -> ApiResult<Json<FindClipsResponse>> {
    request.validate()?;

    let input = locate_video(&state, &request.video_id).await?;
    let candidates = select_candidates(&request.segments, NO_SPEECH_THRESHOLD, MAX_AUTO_CLIPS);

    info!(
        video_id = %request.video_id,
        segments = request.segments.len(),
        candidates = candidates.len(),
        "Generating clips"
    );

    let jobs = candidates
        .into_iter()
        .map(|candidate| {
            let output = state
                .config
                .download_dir
                .join(format!("clip_{}_{}.mp4", candidate.index, Uuid::new_v4()));
            AutoClipJob { candidate, output }
        })
        .collect();

    let results = state.engine.generate_auto_clips(&input, jobs).await;

    let clips = results
        .into_iter()
        .map(|r| {
            let (generated_url, error) = match &r.result {
                Ok(clip) => (Some(download_url(&clip.path)), None),
                Err(e) => (None, Some(e.to_string())),
            };
            GeneratedClip {
                index: r.candidate.index,
                start: r.candidate.start,
                end: r.candidate.end,
                text: r.candidate.text,
                confidence: r.candidate.confidence,
                generated_url,
                error,
            }
        })
        .collect();

    Ok(Json(FindClipsResponse {
        success: true,
        clips,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_video_id() {
        assert!(validate_video_id("abc_123").is_ok());
        assert!(validate_video_id("../etc").is_err());
        assert!(validate_video_id("a/b").is_err());
        assert!(validate_video_id("a\\b").is_err());
    }

    #[test]
    fn test_download_url() {
        assert_eq!(
            download_url(Path::new("downloads/clip_1.mp4")),
            "/downloads/clip_1.mp4"
        );
    }
}
