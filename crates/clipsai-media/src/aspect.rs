//! Aspect ratio conversion by single-axis cropping around the focal point.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use clipsai_models::{CropRect, EncodingConfig, FocalPoint, TargetAspect, TimeWindow};

use crate::analysis::VisualInterestAnalyzer;
use crate::encoder::{EncodeJob, MediaEncoder};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{copy_file, remove_partial_output};
use crate::probe::DurationProbe;

/// Ratios closer than this are considered equal and the file is copied as is.
pub const RATIO_TOLERANCE: f64 = 0.01;

/// Result of an aspect conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedClip {
    pub path: PathBuf,
    /// Crop applied, `None` when the source already had the target ratio
    pub crop: Option<CropRect>,
    pub focal_point: FocalPoint,
    /// The output is a byte-identical copy of the input
    pub copied: bool,
}

/// Compute the crop of a `width` x `height` frame for `target_ratio`.
///
/// Keeps the full height of sources wider than the target (full width
/// otherwise) and slides the other axis toward the focal point. Dimensions
/// are rounded down to even numbers for 4:2:0 output, and the rectangle always
/// lies inside the frame.
pub fn compute_crop(width: u32, height: u32, target_ratio: f64, focal: &FocalPoint) -> CropRect {
    let current_ratio = width as f64 / height as f64;

    if current_ratio > target_ratio {
        let new_width = even_dimension(height as f64 * target_ratio, width);
        let new_height = even_dimension(height as f64, height);
        let x = offset(width, new_width, focal.center_x);
        CropRect::new(x, 0, new_width, new_height)
    } else {
        let new_height = even_dimension(width as f64 / target_ratio, height);
        let new_width = even_dimension(width as f64, width);
        let y = offset(height, new_height, focal.center_y);
        CropRect::new(0, y, new_width, new_height)
    }
}

fn even_dimension(value: f64, limit: u32) -> u32 {
    let value = (value.max(0.0).floor() as u32).min(limit);
    let even = value & !1;
    if even >= 2 {
        even
    } else {
        limit.min(2)
    }
}

fn offset(dimension: u32, cropped: u32, focus: f64) -> u32 {
    let slack = dimension.saturating_sub(cropped);
    ((slack as f64 * focus) as u32).min(slack)
}

/// Converts clips to a target aspect ratio.
#[derive(Clone)]
pub struct AspectConverter {
    probe: DurationProbe,
    analyzer: VisualInterestAnalyzer,
    encoder: Arc<dyn MediaEncoder>,
    encoding: EncodingConfig,
}

impl AspectConverter {
    pub fn new(
        probe: DurationProbe,
        analyzer: VisualInterestAnalyzer,
        encoder: Arc<dyn MediaEncoder>,
    ) -> Self {
        Self {
            probe,
            analyzer,
            encoder,
            encoding: EncodingConfig::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Name of the frame analyzer in use.
    pub fn analyzer_name(&self) -> &'static str {
        self.analyzer.name()
    }

    /// Convert `input` to `target`, looking at `window` for the focal point.
    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        target: TargetAspect,
        window: TimeWindow,
    ) -> MediaResult<ConvertedClip> {
        let focal_point = self.analyzer.analyze(input, window).await;
        let media = self.probe.probe(input).await?;

        let target_ratio = target.ratio();
        if (media.ratio() - target_ratio).abs() < RATIO_TOLERANCE {
            info!(
                input = %input.display(),
                aspect = %target,
                "Source already has target aspect ratio, copying"
            );
            copy_file(input, output)
                .await
                .map_err(MediaError::into_conversion_failed)?;
            return Ok(ConvertedClip {
                path: output.to_path_buf(),
                crop: None,
                focal_point,
                copied: true,
            });
        }

        let crop = compute_crop(media.width, media.height, target_ratio, &focal_point);
        info!(
            input = %input.display(),
            aspect = %target,
            source_width = media.width,
            source_height = media.height,
            crop = %crop.to_filter(),
            focal_confidence = focal_point.confidence,
            "Converting aspect ratio"
        );

        let job = EncodeJob::crop(input, output, crop).with_encoding(self.encoding.clone());
        if let Err(e) = self.encoder.encode(&job).await {
            remove_partial_output(output).await;
            let e = e.into_conversion_failed();
            warn!(output = %output.display(), error = %e, "Aspect conversion failed");
            return Err(e);
        }

        Ok(ConvertedClip {
            path: output.to_path_buf(),
            crop: Some(crop),
            focal_point,
            copied: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::FixedAnalyzer;
    use crate::encoder::tests::{FakeEncoder, FakeOutcome};
    use crate::probe::tests::FakeInspector;
    use tempfile::TempDir;

    #[test]
    fn test_landscape_to_vertical() {
        let crop = compute_crop(
            1920,
            1080,
            TargetAspect::Vertical.ratio(),
            &FocalPoint::center(1.0),
        );
        assert_eq!(crop.height, 1080);
        assert_eq!(crop.width, 606);
        assert_eq!(crop.y, 0);
        assert_eq!(crop.x, 657);
        assert!(crop.fits_within(1920, 1080));
    }

    #[test]
    fn test_portrait_to_widescreen_follows_focus() {
        let widescreen = TargetAspect::Widescreen.ratio();
        let top = compute_crop(1080, 1920, widescreen, &FocalPoint::new(0.5, 0.0, 1.0));
        assert_eq!(top.y, 0);
        assert_eq!(top.width, 1080);
        assert_eq!(top.height, 606);

        let bottom = compute_crop(1080, 1920, widescreen, &FocalPoint::new(0.5, 1.0, 1.0));
        assert_eq!(bottom.y + bottom.height, 1920);
        assert!(bottom.fits_within(1080, 1920));
    }

    #[test]
    fn test_crop_always_inside_frame() {
        let sizes = [
            (1920, 1080),
            (1080, 1920),
            (1280, 720),
            (641, 479),
            (3, 1000),
            (1000, 3),
            (2, 2),
        ];
        for (w, h) in sizes {
            for aspect in TargetAspect::ALL {
                for i in 0..=10 {
                    for j in 0..=10 {
                        let focal = FocalPoint::new(i as f64 / 10.0, j as f64 / 10.0, 0.5);
                        let crop = compute_crop(w, h, aspect.ratio(), &focal);
                        assert!(
                            crop.fits_within(w, h),
                            "{crop:?} escapes {w}x{h} for {aspect} at {focal:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_crop_ratio_close_to_target() {
        for aspect in TargetAspect::ALL {
            let crop = compute_crop(1920, 1080, aspect.ratio(), &FocalPoint::unavailable());
            assert!((crop.ratio() - aspect.ratio()).abs() < 0.01, "{aspect}: {crop:?}");
        }
    }

    fn converter(width: u32, height: u32, encoder: Arc<FakeEncoder>) -> AspectConverter {
        AspectConverter::new(
            DurationProbe::new(FakeInspector::video(10.0, width, height)),
            VisualInterestAnalyzer::new(Arc::new(FixedAnalyzer(Some(FocalPoint::new(
                0.0, 0.5, 0.9,
            ))))),
            encoder,
        )
    }

    async fn source(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("temp.mp4");
        let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, payload).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_matching_ratio_copies_verbatim() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("clip.mp4");
        let encoder = FakeEncoder::new(FakeOutcome::Write(4096));

        let clip = converter(1920, 1080, encoder.clone())
            .convert(&input, &output, TargetAspect::Widescreen, TimeWindow::new(0.0, 10.0).unwrap())
            .await
            .unwrap();

        assert!(clip.copied);
        assert!(clip.crop.is_none());
        assert_eq!(encoder.job_count(), 0);
        assert_eq!(
            tokio::fs::read(&output).await.unwrap(),
            tokio::fs::read(&input).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_crop_uses_focal_point() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("clip.mp4");
        let encoder = FakeEncoder::new(FakeOutcome::Write(4096));

        let clip = converter(1920, 1080, encoder.clone())
            .convert(&input, &output, TargetAspect::Vertical, TimeWindow::new(0.0, 10.0).unwrap())
            .await
            .unwrap();

        assert!(!clip.copied);
        assert_eq!(clip.crop, Some(CropRect::new(0, 0, 606, 1080)));
        assert!((clip.focal_point.confidence - 0.9).abs() < 1e-9);

        let jobs = encoder.jobs.lock().unwrap();
        assert_eq!(jobs[0].crop, clip.crop);
        assert!(jobs[0].seek.is_none());
    }

    #[tokio::test]
    async fn test_encoder_failure_is_conversion_failed() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("clip.mp4");

        let err = converter(1920, 1080, FakeEncoder::new(FakeOutcome::WriteThenFail(100)))
            .convert(&input, &output, TargetAspect::Square, TimeWindow::new(0.0, 10.0).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "conversion_failed");
        assert_eq!(err.stderr(), Some("Conversion failed!"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_probe_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let input = source(&dir).await;
        let output = dir.path().join("clip.mp4");
        let converter = AspectConverter::new(
            DurationProbe::new(FakeInspector::failing("no streams")),
            VisualInterestAnalyzer::default(),
            FakeEncoder::new(FakeOutcome::Write(4096)),
        );

        let err = converter
            .convert(&input, &output, TargetAspect::Vertical, TimeWindow::new(0.0, 1.0).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "probe_failed");
    }
}
