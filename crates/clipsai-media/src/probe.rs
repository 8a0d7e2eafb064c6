//! FFprobe video information and the duration probe built on it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Default timeout for one ffprobe invocation.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;

/// Raw stream/format facts reported by the inspector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// File size in bytes
    pub size: u64,
}

/// Adapter over an external media inspection tool.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn inspect(&self, path: &Path) -> MediaResult<VideoInfo>;
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
///
/// Missing dimensions come back as zero and are rejected by [`DurationProbe`].
pub fn parse_probe_output(stdout: &[u8]) -> MediaResult<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .ok_or_else(|| MediaError::internal("ffprobe reported no numeric duration"))?;

    let size = probe
        .format
        .size
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let fps = video_stream
        .and_then(|s| s.avg_frame_rate.as_deref().or(s.r_frame_rate.as_deref()))
        .and_then(parse_frame_rate)
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration,
        width: video_stream.and_then(|s| s.width).unwrap_or(0),
        height: video_stream.and_then(|s| s.height).unwrap_or(0),
        fps,
        size,
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let fps = if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        s.parse().ok()?
    };

    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// [`MediaInspector`] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    program: String,
    timeout: Duration,
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeInspector {
    pub fn new() -> Self {
        Self {
            program: "ffprobe".to_string(),
            timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Use a different binary than `ffprobe` from PATH.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn inspect(&self, path: &Path) -> MediaResult<VideoInfo> {
        which::which(&self.program).map_err(|_| MediaError::FfprobeNotFound)?;

        let child = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| MediaError::Timeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::probe_failed(
                path,
                format!("ffprobe exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        parse_probe_output(&output.stdout)
    }
}

/// A probed source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Size on disk in bytes
    pub size: u64,
    pub width: u32,
    pub height: u32,
    /// Duration in seconds
    pub duration: f64,
    pub fps: f64,
}

impl MediaFile {
    /// Width divided by height.
    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Reads duration and native dimensions of a media file.
#[derive(Clone)]
pub struct DurationProbe {
    inspector: Arc<dyn MediaInspector>,
}

impl DurationProbe {
    pub fn new(inspector: Arc<dyn MediaInspector>) -> Self {
        Self { inspector }
    }

    /// Probe `path`. Every failure surfaces as [`MediaError::ProbeFailed`].
    pub async fn probe(&self, path: &Path) -> MediaResult<MediaFile> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| MediaError::probe_failed(path, format!("cannot stat file: {e}")))?;

        let info = self
            .inspector
            .inspect(path)
            .await
            .map_err(|e| match e {
                MediaError::ProbeFailed { .. } => e,
                other => MediaError::probe_failed(path, other.to_string()),
            })?;

        if !info.duration.is_finite() || info.duration <= 0.0 {
            return Err(MediaError::probe_failed(
                path,
                format!("unusable duration {}", info.duration),
            ));
        }
        if info.width == 0 || info.height == 0 {
            return Err(MediaError::probe_failed(path, "no video dimensions"));
        }

        debug!(
            path = %path.display(),
            duration = info.duration,
            width = info.width,
            height = info.height,
            "Probed media file"
        );

        Ok(MediaFile {
            path: path.to_path_buf(),
            size: metadata.len(),
            width: info.width,
            height: info.height,
            duration: info.duration,
            fps: info.fps,
        })
    }
}
