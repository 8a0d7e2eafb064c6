//! Application state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use clipsai_media::fs_utils::copy_file;
use clipsai_media::{select_frame_analyzer, ClipEngine, EngineConfig};
use clipsai_models::PreloadedVideo;

use crate::config::ApiConfig;

/// File name of the preloaded test video inside the upload directory.
pub const PRELOADED_FILENAME: &str = "video_preloaded_test.mp4";
/// Video id clients use to refer to the preloaded test video.
pub const PRELOADED_VIDEO_ID: &str = "preloaded_test";

/// Shared application state, built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub engine: ClipEngine,
    pub preloaded: Option<Arc<PreloadedVideo>>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(
        config: ApiConfig,
        engine_config: EngineConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        for dir in config.directories() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let analyzer = select_frame_analyzer(&engine_config.analysis);
        let engine = ClipEngine::new(&engine_config, analyzer);
        let preloaded = preload_video(&config).await;

        Ok(Self::from_parts(config, engine, preloaded))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        config: ApiConfig,
        engine: ClipEngine,
        preloaded: Option<PreloadedVideo>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            preloaded: preloaded.map(Arc::new),
        }
    }

    /// Name of the frame analyzer chosen at startup.
    pub fn analyzer_name(&self) -> &'static str {
        self.engine.converter().analyzer_name()
    }

    /// Whether frame analysis runs or crops fall back to the frame center.
    pub fn visual_analysis(&self) -> bool {
        self.analyzer_name() != "center_fallback"
    }
}

/// Copy the configured test video into the upload directory once.
pub async fn preload_video(config: &ApiConfig) -> Option<PreloadedVideo> {
    let dest = config.upload_dir.join(PRELOADED_FILENAME);

    if !dest.exists() {
        let source = config.preloaded_video.as_deref()?;
        if !source.exists() {
            warn!(source = %source.display(), "No test video available");
            return None;
        }
        if let Err(e) = copy_file(source, &dest).await {
            warn!(source = %source.display(), error = %e, "Failed to preload test video");
            return None;
        }
        info!(dest = %dest.display(), "Preloaded test video");
    }

    let size = tokio::fs::metadata(&dest).await.ok()?.len();
    Some(PreloadedVideo {
        filename: source_name(config.preloaded_video.as_deref(), &dest),
        video_id: PRELOADED_VIDEO_ID.to_string(),
        size,
        url: format!("/uploads/{PRELOADED_FILENAME}"),
        preloaded: true,
    })
}

fn source_name(source: Option<&Path>, dest: &Path) -> String {
    source
        .or(Some(dest))
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| PRELOADED_FILENAME.to_string())
}

/// Find the uploaded video whose file name contains `video_id`.
pub async fn find_upload(upload_dir: &Path, video_id: &str) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(upload_dir).await.ok()?;
    let mut matches = Vec::new();

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if name.to_string_lossy().contains(video_id) && entry.path().is_file() {
            matches.push(entry.path());
        }
    }

    // read_dir order is platform dependent
    matches.sort();
    matches.into_iter().next()
}
