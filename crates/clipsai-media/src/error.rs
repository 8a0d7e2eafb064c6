//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use clipsai_models::WindowError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Probe failed for {path}: {message}")]
    ProbeFailed { path: PathBuf, message: String },

    #[error("Encode failed: {message}")]
    EncodeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Aspect ratio conversion failed: {message}")]
    ConversionFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Frame analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a probe failure error.
    pub fn probe_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an encode failure error.
    pub fn encode_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::EncodeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a frame analysis failure error.
    pub fn analysis_failed(message: impl Into<String>) -> Self {
        Self::AnalysisFailed(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Re-tag an encoder failure as an encode failure of the trimming step.
    pub fn into_encode_failed(self) -> Self {
        match self {
            MediaError::FfmpegFailed { message, stderr, .. } => {
                MediaError::EncodeFailed { message, stderr }
            }
            MediaError::Timeout(secs) => {
                MediaError::encode_failed(format!("encoder timed out after {secs}s"), None)
            }
            MediaError::FfmpegNotFound => {
                MediaError::encode_failed("FFmpeg not found in PATH", None)
            }
            MediaError::Io(e) => MediaError::encode_failed(format!("encoder I/O error: {e}"), None),
            other => other,
        }
    }

    /// Re-tag an encoder failure as an aspect conversion failure.
    pub fn into_conversion_failed(self) -> Self {
        match self {
            MediaError::FfmpegFailed { message, stderr, .. }
            | MediaError::EncodeFailed { message, stderr } => {
                MediaError::ConversionFailed { message, stderr }
            }
            MediaError::Timeout(secs) => MediaError::ConversionFailed {
                message: format!("encoder timed out after {secs}s"),
                stderr: None,
            },
            MediaError::FfmpegNotFound => MediaError::ConversionFailed {
                message: "FFmpeg not found in PATH".to_string(),
                stderr: None,
            },
            MediaError::Io(e) => MediaError::ConversionFailed {
                message: format!("encoder I/O error: {e}"),
                stderr: None,
            },
            other => other,
        }
    }

    /// Short machine-readable label, used for metrics and API error codes.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaError::InvalidRange(_) => "invalid_range",
            MediaError::ProbeFailed { .. } | MediaError::FfprobeNotFound => "probe_failed",
            MediaError::EncodeFailed { .. } => "encode_failed",
            MediaError::ConversionFailed { .. } => "conversion_failed",
            MediaError::FfmpegNotFound | MediaError::FfmpegFailed { .. } => "ffmpeg_failed",
            MediaError::FileNotFound(_) => "not_found",
            MediaError::Timeout(_) => "timeout",
            MediaError::AnalysisFailed(_) => "analysis_failed",
            MediaError::Io(_) | MediaError::JsonParse(_) | MediaError::Internal(_) => "internal",
        }
    }

    /// Encoder diagnostic text, when the failure came with any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            MediaError::EncodeFailed { stderr, .. }
            | MediaError::ConversionFailed { stderr, .. }
            | MediaError::FfmpegFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}

impl From<WindowError> for MediaError {
    fn from(e: WindowError) -> Self {
        MediaError::InvalidRange(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_failure_retagging() {
        let err = MediaError::ffmpeg_failed("exit 1", Some("bad crop".to_string()), Some(1));
        let trimmed = err.into_encode_failed();
        assert_eq!(trimmed.kind(), "encode_failed");
        assert_eq!(trimmed.stderr(), Some("bad crop"));

        let err = MediaError::Timeout(300).into_conversion_failed();
        assert_eq!(err.kind(), "conversion_failed");
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn test_window_error_is_invalid_range() {
        let err: MediaError = WindowError::NotFinite.into();
        assert_eq!(err.kind(), "invalid_range");
    }
}
