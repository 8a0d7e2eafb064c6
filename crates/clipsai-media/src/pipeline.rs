//! Clip rendering pipeline: trim, then optionally convert.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use clipsai_models::{AspectRequest, ClipCandidate, FocalPoint, TimeWindow, TranscriptSegment};

use crate::analysis::{FrameAnalyzer, VisualInterestAnalyzer};
use crate::aspect::AspectConverter;
use crate::config::EngineConfig;
use crate::encoder::{FfmpegEncoder, MediaEncoder};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{move_file, remove_partial_output};
use crate::metrics;
use crate::probe::{DurationProbe, FfprobeInspector, MediaInspector};
use crate::trim::{PreciseTrimmer, TrimmedClip};

/// Segments at or above this no-speech probability are never clipped.
pub const NO_SPEECH_THRESHOLD: f64 = 0.5;

/// Maximum number of auto-generated clips per request.
pub const MAX_AUTO_CLIPS: usize = 5;

/// One manual clip request with caller-chosen output paths.
#[derive(Debug, Clone)]
pub struct ClipJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Intermediate trimmed file, removed once the clip is done
    pub scratch: PathBuf,
    pub window: TimeWindow,
    pub aspect: AspectRequest,
}

/// A rendered clip.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedClip {
    pub path: PathBuf,
    /// Effective window after clamping
    pub window: TimeWindow,
    pub aspect: AspectRequest,
    /// Present when an aspect conversion ran
    pub focal_point: Option<FocalPoint>,
}

/// One auto-clip candidate and where to write it.
#[derive(Debug, Clone)]
pub struct AutoClipJob {
    pub candidate: ClipCandidate,
    pub output: PathBuf,
}

/// Outcome of one auto-clip.
#[derive(Debug)]
pub struct AutoClipResult {
    pub candidate: ClipCandidate,
    pub result: MediaResult<TrimmedClip>,
}

/// Keep segments that contain speech, in transcript order, capped at `limit`.
pub fn select_candidates(
    segments: &[TranscriptSegment],
    threshold: f64,
    limit: usize,
) -> Vec<ClipCandidate> {
    segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.no_speech_prob < threshold)
        .take(limit)
        .map(|(i, s)| ClipCandidate::from_segment(i, s))
        .collect()
}

/// The transformation engine behind the HTTP layer.
#[derive(Clone)]
pub struct ClipEngine {
    trimmer: PreciseTrimmer,
    converter: AspectConverter,
}

impl ClipEngine {
    /// Engine backed by the real ffprobe/ffmpeg binaries.
    pub fn new(config: &EngineConfig, analyzer: Arc<dyn FrameAnalyzer>) -> Self {
        Self::with_adapters(
            Arc::new(FfprobeInspector::new().with_timeout(config.probe_timeout_secs)),
            Arc::new(FfmpegEncoder::new(config.encode_timeout_secs)),
            analyzer,
        )
    }

    pub fn with_adapters(
        inspector: Arc<dyn MediaInspector>,
        encoder: Arc<dyn MediaEncoder>,
        analyzer: Arc<dyn FrameAnalyzer>,
    ) -> Self {
        let probe = DurationProbe::new(inspector);
        let trimmer = PreciseTrimmer::new(probe.clone(), Arc::clone(&encoder));
        let converter =
            AspectConverter::new(probe, VisualInterestAnalyzer::new(analyzer), encoder);
        Self {
            trimmer,
            converter,
        }
    }

    pub fn converter(&self) -> &AspectConverter {
        &self.converter
    }

    /// Trim into `job.scratch`, then convert into `job.output` or move the
    /// scratch file there for [`AspectRequest::Original`].
    pub async fn render_clip(&self, job: &ClipJob) -> MediaResult<RenderedClip> {
        let result = self.render_inner(job).await;
        match &result {
            Ok(clip) => metrics::record_clip_rendered(&clip.aspect.to_string()),
            Err(e) => metrics::record_clip_failed(e.kind()),
        }
        result
    }

    async fn render_inner(&self, job: &ClipJob) -> MediaResult<RenderedClip> {
        let trimmed = self
            .trimmer
            .trim(&job.input, &job.scratch, job.window.start, job.window.end)
            .await?;

        let Some(target) = job.aspect.target() else {
            if let Err(e) = move_file(&job.scratch, &job.output).await {
                remove_partial_output(&job.scratch).await;
                return Err(e);
            }
            return Ok(RenderedClip {
                path: job.output.clone(),
                window: trimmed.window,
                aspect: job.aspect,
                focal_point: None,
            });
        };

        // The scratch file starts at zero
        let relative = TimeWindow::from_duration(trimmed.window.duration())?;
        let converted = self
            .converter
            .convert(&job.scratch, &job.output, target, relative)
            .await;
        remove_partial_output(&job.scratch).await;
        let converted = converted?;

        info!(
            output = %converted.path.display(),
            window = %trimmed.window,
            aspect = %target,
            copied = converted.copied,
            "Clip rendered"
        );

        Ok(RenderedClip {
            path: converted.path,
            window: trimmed.window,
            aspect: job.aspect,
            focal_point: Some(converted.focal_point),
        })
    }

    /// Trim every candidate. A failed candidate does not stop the others.
    pub async fn generate_auto_clips(
        &self,
        input: &Path,
        jobs: Vec<AutoClipJob>,
    ) -> Vec<AutoClipResult> {
        let mut results = Vec::with_capacity(jobs.len());

        for job in jobs {
            let result = self
                .trimmer
                .trim(input, &job.output, job.candidate.start, job.candidate.end)
                .await;

            match &result {
                Ok(_) => metrics::record_clip_rendered("original"),
                Err(e) => {
                    metrics::record_clip_failed(e.kind());
                    warn!(
                        index = job.candidate.index,
                        start = job.candidate.start,
                        end = job.candidate.end,
                        error = %e,
                        "Auto clip failed"
                    );
                }
            }

            results.push(AutoClipResult {
                candidate: job.candidate,
                result,
            });
        }

        results
    }
}

impl AutoClipResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&MediaError> {
        self.result.as_ref().err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::FixedAnalyzer;
    use crate::analysis::CenterFallbackAnalyzer;
    use crate::encoder::tests::{FakeEncoder, FakeOutcome};
    use crate::probe::tests::FakeInspector;
    use clipsai_models::TargetAspect;
    use tempfile::TempDir;

    fn segment(start: f64, end: f64, no_speech_prob: f64) -> TranscriptSegment {
        TranscriptSegment {
            start,
            end,
            text: format!("{start}-{end}"),
            no_speech_prob,
        }
    }

    #[test]
    fn test_select_candidates() {
        let segments = vec![
            segment(0.0, 2.0, 0.1),
            segment(2.0, 4.0, 0.9),
            segment(4.0, 6.0, 0.5),
            segment(6.0, 8.0, 0.49),
        ];
        let candidates = select_candidates(&segments, NO_SPEECH_THRESHOLD, MAX_AUTO_CLIPS);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].index, 0);
        assert_eq!(candidates[1].index, 3);
        assert!((candidates[1].confidence - 0.51).abs() < 1e-9);
    }

    #[test]
    fn test_select_candidates_keeps_transcript_order_and_cap() {
        let segments: Vec<_> = (0..10)
            .map(|i| segment(i as f64, i as f64 + 1.0, 0.4 - i as f64 * 0.01))
            .collect();
        let candidates = select_candidates(&segments, NO_SPEECH_THRESHOLD, MAX_AUTO_CLIPS);
        let indices: Vec<_> = candidates.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    fn engine(width: u32, height: u32, encoder: Arc<FakeEncoder>) -> ClipEngine {
        ClipEngine::with_adapters(
            FakeInspector::video(30.0, width, height),
            encoder,
            Arc::new(FixedAnalyzer(Some(FocalPoint::new(0.5, 0.5, 0.8)))),
        )
    }

    async fn setup() -> (TempDir, ClipJob) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("uploads").join("video.mp4");
        tokio::fs::create_dir_all(input.parent().unwrap()).await.unwrap();
        tokio::fs::write(&input, vec![0u8; 10_000]).await.unwrap();
        tokio::fs::create_dir_all(dir.path().join("downloads")).await.unwrap();
        let job = ClipJob {
            input,
            output: dir.path().join("downloads").join("clip_1.mp4"),
            scratch: dir.path().join("temp_1.mp4"),
            window: TimeWindow::new(5.0, 10.0).unwrap(),
            aspect: AspectRequest::Original,
        };
        (dir, job)
    }

    #[tokio::test]
    async fn test_original_aspect_moves_scratch() {
        let (_dir, job) = setup().await;
        let encoder = FakeEncoder::new(FakeOutcome::Write(4096));

        let clip = engine(1920, 1080, encoder.clone()).render_clip(&job).await.unwrap();

        assert_eq!(clip.path, job.output);
        assert!(clip.focal_point.is_none());
        assert!(job.output.exists());
        assert!(!job.scratch.exists());
        assert_eq!(encoder.job_count(), 1);
    }

    #[tokio::test]
    async fn test_conversion_removes_scratch() {
        let (_dir, mut job) = setup().await;
        job.aspect = AspectRequest::Convert(TargetAspect::Vertical);
        let encoder = FakeEncoder::new(FakeOutcome::Write(4096));

        let clip = engine(1920, 1080, encoder.clone()).render_clip(&job).await.unwrap();

        assert_eq!(clip.window, TimeWindow::new(5.0, 10.0).unwrap());
        assert!((clip.focal_point.unwrap().confidence - 0.8).abs() < 1e-9);
        assert!(job.output.exists());
        assert!(!job.scratch.exists());

        let jobs = encoder.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].input, job.scratch);
        assert!(jobs[1].crop.is_some());
    }

    #[tokio::test]
    async fn test_failed_trim_leaves_nothing() {
        let (_dir, job) = setup().await;
        let err = engine(1920, 1080, FakeEncoder::new(FakeOutcome::WriteThenFail(5000)))
            .render_clip(&job)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "encode_failed");
        assert!(!job.scratch.exists());
        assert!(!job.output.exists());
    }

    #[tokio::test]
    async fn test_auto_clips_report_each_candidate() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("video.mp4");
        tokio::fs::write(&input, vec![0u8; 10_000]).await.unwrap();

        let engine = ClipEngine::with_adapters(
            FakeInspector::video(30.0, 1280, 720),
            FakeEncoder::new(FakeOutcome::Write(2048)),
            Arc::new(CenterFallbackAnalyzer),
        );

        let segments = vec![segment(1.0, 3.0, 0.1), segment(40.0, 45.0, 0.2)];
        let jobs = select_candidates(&segments, NO_SPEECH_THRESHOLD, MAX_AUTO_CLIPS)
            .into_iter()
            .map(|candidate| AutoClipJob {
                output: dir.path().join(format!("clip_{}.mp4", candidate.index)),
                candidate,
            })
            .collect();

        let results = engine.generate_auto_clips(&input, jobs).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_success());
        assert_eq!(results[1].error().map(|e| e.kind()), Some("invalid_range"));
        assert!(dir.path().join("clip_0.mp4").exists());
        assert!(!dir.path().join("clip_1.mp4").exists());
    }
}
