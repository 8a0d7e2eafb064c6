//! Visual interest analysis.
//!
//! A [`FrameAnalyzer`] is chosen once at startup by [`select_frame_analyzer`]:
//! the OpenCV analyzer when the `opencv` feature is compiled in and its face
//! cascade loads, otherwise [`CenterFallbackAnalyzer`].

pub mod scoring;

#[cfg(feature = "opencv")]
mod opencv_analyzer;

#[cfg(feature = "opencv")]
pub use opencv_analyzer::OpenCvAnalyzer;
pub use scoring::{sample_frame_indices, select_focal_point, FaceRegion, FrameSignals};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use clipsai_models::{FocalPoint, TimeWindow};

use crate::config::AnalysisConfig;
use crate::error::MediaResult;

/// Finds the focal point of a time window. Implementations block.
pub trait FrameAnalyzer: Send + Sync {
    fn analyze(&self, path: &Path, window: TimeWindow) -> MediaResult<FocalPoint>;

    /// Whether this analyzer looks at frames at all.
    fn is_available(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Analyzer used when frame analysis is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterFallbackAnalyzer;

impl FrameAnalyzer for CenterFallbackAnalyzer {
    fn analyze(&self, _path: &Path, _window: TimeWindow) -> MediaResult<FocalPoint> {
        Ok(FocalPoint::unavailable())
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "center_fallback"
    }
}

/// Pick the best analyzer this build and environment support.
pub fn select_frame_analyzer(config: &AnalysisConfig) -> Arc<dyn FrameAnalyzer> {
    if !config.enabled {
        info!("Visual analysis disabled by configuration");
        return Arc::new(CenterFallbackAnalyzer);
    }

    #[cfg(feature = "opencv")]
    {
        match OpenCvAnalyzer::load(config) {
            Ok(analyzer) => {
                info!(
                    cascade = %config.face_cascade_path.display(),
                    "Visual analysis enabled"
                );
                return Arc::new(analyzer);
            }
            Err(e) => {
                warn!(error = %e, "Visual analysis unavailable, cropping around frame center");
            }
        }
    }

    #[cfg(not(feature = "opencv"))]
    info!("Built without OpenCV, cropping around frame center");

    Arc::new(CenterFallbackAnalyzer)
}

/// Async front for a [`FrameAnalyzer`].
///
/// Runs on the blocking pool and never fails: analyzer errors degrade to
/// [`FocalPoint::unavailable`].
#[derive(Clone)]
pub struct VisualInterestAnalyzer {
    inner: Arc<dyn FrameAnalyzer>,
}

impl VisualInterestAnalyzer {
    pub fn new(inner: Arc<dyn FrameAnalyzer>) -> Self {
        Self { inner }
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    pub async fn analyze(&self, path: &Path, window: TimeWindow) -> FocalPoint {
        if !self.inner.is_available() {
            return FocalPoint::unavailable();
        }

        let inner = Arc::clone(&self.inner);
        let owned: PathBuf = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || inner.analyze(&owned, window)).await;

        match result {
            Ok(Ok(point)) => point,
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "Visual analysis failed");
                FocalPoint::unavailable()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Visual analysis task panicked");
                FocalPoint::unavailable()
            }
        }
    }
}

impl Default for VisualInterestAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(CenterFallbackAnalyzer))
    }
}
