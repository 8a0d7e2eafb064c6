//! Encoder adapter.

use async_trait::async_trait;
use std::path::PathBuf;

use clipsai_models::{CropRect, EncodingConfig, TimeWindow};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Default timeout for one encode.
pub const DEFAULT_ENCODE_TIMEOUT_SECS: u64 = 300;

/// One encoder invocation: optional trim, optional crop, fixed output policy.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Input-side seek in seconds
    pub seek: Option<f64>,
    /// Output duration in seconds
    pub duration: Option<f64>,
    pub crop: Option<CropRect>,
    pub encoding: EncodingConfig,
}

impl EncodeJob {
    /// Re-encode `window` of `input`.
    pub fn trim(input: impl Into<PathBuf>, output: impl Into<PathBuf>, window: TimeWindow) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            seek: Some(window.start),
            duration: Some(window.duration()),
            crop: None,
            encoding: EncodingConfig::default(),
        }
    }

    /// Re-encode all of `input` cropped to `crop`.
    pub fn crop(input: impl Into<PathBuf>, output: impl Into<PathBuf>, crop: CropRect) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            seek: None,
            duration: None,
            crop: Some(crop),
            encoding: EncodingConfig::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Build the FFmpeg command for this job.
    pub fn to_command(&self) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(&self.input, &self.output);

        if let Some(seek) = self.seek {
            cmd = cmd.seek(seek);
        }
        if let Some(duration) = self.duration {
            cmd = cmd.duration(duration);
        }
        if let Some(crop) = &self.crop {
            cmd = cmd.crop(crop);
        }

        cmd = cmd.encoding(&self.encoding);

        if self.seek.is_some() {
            cmd = cmd.zero_timestamps();
        }

        cmd
    }
}

/// Adapter over an external encoder.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    async fn encode(&self, job: &EncodeJob) -> MediaResult<()>;
}

/// [`MediaEncoder`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    runner: FfmpegRunner,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODE_TIMEOUT_SECS)
    }
}

impl FfmpegEncoder {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(timeout_secs),
        }
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn encode(&self, job: &EncodeJob) -> MediaResult<()> {
        self.runner.run(&job.to_command()).await
    }
}
