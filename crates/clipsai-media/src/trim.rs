//! Precise time-window trimming.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use clipsai_models::{EncodingConfig, TimeWindow};

use crate::encoder::{EncodeJob, MediaEncoder};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::remove_partial_output;
use crate::probe::DurationProbe;

/// Outputs smaller than this are treated as truncated or corrupt.
pub const MIN_OUTPUT_BYTES: u64 = 1024;

/// A successfully trimmed clip.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedClip {
    pub path: PathBuf,
    /// Window actually encoded, after clamping to the source duration
    pub window: TimeWindow,
    /// Output size in bytes
    pub size: u64,
}

/// Cuts exactly one time window out of a source file.
///
/// Never falls back to the untrimmed source: a failed trim is an error and
/// leaves no output behind.
#[derive(Clone)]
pub struct PreciseTrimmer {
    probe: DurationProbe,
    encoder: Arc<dyn MediaEncoder>,
    encoding: EncodingConfig,
}

impl PreciseTrimmer {
    pub fn new(probe: DurationProbe, encoder: Arc<dyn MediaEncoder>) -> Self {
        Self {
            probe,
            encoder,
            encoding: EncodingConfig::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Trim `[start, end)` of `input` into `output`.
    pub async fn trim(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        end: f64,
    ) -> MediaResult<TrimmedClip> {
        let requested = TimeWindow::new(start, end)?;
        let media = self.probe.probe(input).await?;
        let window = requested.clamp_to(media.duration)?;

        info!(
            input = %input.display(),
            output = %output.display(),
            %window,
            source_duration = media.duration,
            "Trimming clip"
        );

        match self.encode_and_verify(input, output, window).await {
            Ok(size) => Ok(TrimmedClip {
                path: output.to_path_buf(),
                window,
                size,
            }),
            Err(e) => {
                remove_partial_output(output).await;
                warn!(output = %output.display(), error = %e, "Trim failed");
                Err(e)
            }
        }
    }

    async fn encode_and_verify(
        &self,
        input: &Path,
        output: &Path,
        window: TimeWindow,
    ) -> MediaResult<u64> {
        let job = EncodeJob::trim(input, output, window).with_encoding(self.encoding.clone());
        self.encoder
            .encode(&job)
            .await
            .map_err(MediaError::into_encode_failed)?;

        let size = match tokio::fs::metadata(output).await {
            Ok(meta) => meta.len(),
            Err(_) => {
                return Err(MediaError::encode_failed(
                    "encoder reported success but wrote no output",
                    None,
                ))
            }
        };

        if size < MIN_OUTPUT_BYTES {
            return Err(MediaError::encode_failed(
                format!("output is only {size} bytes (minimum {MIN_OUTPUT_BYTES})"),
                None,
            ));
        }

        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::tests::{FakeEncoder, FakeOutcome};
    use crate::probe::tests::FakeInspector;
    use tempfile::TempDir;

    async fn source(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("source.mp4");
        tokio::fs::write(&path, vec![1u8; 8192]).await.unwrap();
        path
    }

    fn trimmer(duration: f64, encoder: Arc<FakeEncoder>) -> PreciseTrimmer {
        PreciseTrimmer::new(
            DurationProbe::new(FakeInspector::video(duration, 1920, 1080)),
            encoder,
        )
    }

    #[tokio::test]
    async fn test_inverted_window_is_invalid_range_without_output() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("out.mp4");
        let encoder = FakeEncoder::new(FakeOutcome::Write(4096));
        let trimmer = trimmer(60.0, encoder.clone());

        for (start, end) in [(5.0, 5.0), (10.0, 3.0), (-1.0, -2.0)] {
            let err = trimmer.trim(&input, &output, start, end).await.unwrap_err();
            assert_eq!(err.kind(), "invalid_range");
        }
        assert!(!output.exists());
        assert_eq!(encoder.job_count(), 0);
    }

    #[tokio::test]
    async fn test_window_is_clamped_to_duration() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("out.mp4");
        let encoder = FakeEncoder::new(FakeOutcome::Write(4096));

        let clip = trimmer(20.0, encoder.clone())
            .trim(&input, &output, -4.0, 45.0)
            .await
            .unwrap();

        assert_eq!(clip.window, TimeWindow::new(0.0, 20.0).unwrap());
        assert_eq!(clip.size, 4096);

        let jobs = encoder.jobs.lock().unwrap();
        assert_eq!(jobs[0].seek, Some(0.0));
        assert_eq!(jobs[0].duration, Some(20.0));
    }

    #[tokio::test]
    async fn test_window_past_end_is_invalid_range() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("out.mp4");
        let encoder = FakeEncoder::new(FakeOutcome::Write(4096));

        let err = trimmer(20.0, encoder.clone())
            .trim(&input, &output, 25.0, 30.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_range");
        assert_eq!(encoder.job_count(), 0);
    }

    #[tokio::test]
    async fn test_undersized_output_is_removed() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("out.mp4");

        let err = trimmer(60.0, FakeEncoder::new(FakeOutcome::Write(0)))
            .trim(&input, &output, 1.0, 2.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "encode_failed");
        assert!(!output.exists());

        let err = trimmer(60.0, FakeEncoder::new(FakeOutcome::Write(1023)))
            .trim(&input, &output, 1.0, 2.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "encode_failed");
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_encoder_failure_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("out.mp4");

        let err = trimmer(60.0, FakeEncoder::new(FakeOutcome::WriteThenFail(50_000)))
            .trim(&input, &output, 1.0, 2.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "encode_failed");
        assert_eq!(err.stderr(), Some("Conversion failed!"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_probe_failure_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("out.mp4");
        let encoder = FakeEncoder::new(FakeOutcome::Write(4096));
        let trimmer = PreciseTrimmer::new(
            DurationProbe::new(FakeInspector::failing("moov atom not found")),
            encoder.clone(),
        );

        let err = trimmer.trim(&input, &output, 0.0, 1.0).await.unwrap_err();
        assert_eq!(err.kind(), "probe_failed");
        assert_eq!(encoder.job_count(), 0);
        assert!(!output.exists());
    }
}
