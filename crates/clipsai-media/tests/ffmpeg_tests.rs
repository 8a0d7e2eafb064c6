//! Tests against the real ffmpeg and ffprobe binaries.
//!
//! Run with: cargo test -p clipsai-media --test ffmpeg_tests -- --ignored

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use clipsai_media::{
    compute_crop, AspectConverter, DurationProbe, FfmpegCommand, FfmpegEncoder, FfmpegRunner,
    FfprobeInspector, MediaError, PreciseTrimmer, VisualInterestAnalyzer, MIN_OUTPUT_BYTES,
};
use clipsai_models::{EncodingConfig, TargetAspect, TimeWindow};

fn ffprobe() -> DurationProbe {
    DurationProbe::new(Arc::new(FfprobeInspector::new()))
}

/// Encode a 10 second 640x360 test pattern with a sine tone.
async fn test_source(dir: &TempDir) -> PathBuf {
    let source = dir.path().join("source.mp4");
    let cmd = FfmpegCommand::new("testsrc=size=640x360:rate=30:duration=10", &source)
        .input_arg("-f")
        .input_arg("lavfi")
        .input_arg("-i")
        .input_arg("sine=frequency=440:duration=10")
        .input_arg("-f")
        .input_arg("lavfi")
        .encoding(&EncodingConfig::default())
        .output_arg("-shortest");

    FfmpegRunner::new().with_timeout(60).run(&cmd).await.unwrap();
    source
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_trimmed_duration_matches_window() {
    let dir = TempDir::new().unwrap();
    let source = test_source(&dir).await;
    let output = dir.path().join("trimmed.mp4");

    let trimmer = PreciseTrimmer::new(ffprobe(), Arc::new(FfmpegEncoder::default()));
    let clip = trimmer.trim(&source, &output, 2.0, 5.5).await.unwrap();
    assert_eq!(clip.window, TimeWindow::new(2.0, 5.5).unwrap());
    assert!(clip.size >= MIN_OUTPUT_BYTES);

    let trimmed = ffprobe().probe(&output).await.unwrap();
    assert!(
        (trimmed.duration - 3.5).abs() <= 0.5,
        "trimmed duration {} is not close to 3.5s",
        trimmed.duration
    );
    assert_eq!((trimmed.width, trimmed.height), (640, 360));
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_trim_past_end_is_clamped() {
    let dir = TempDir::new().unwrap();
    let source = test_source(&dir).await;
    let output = dir.path().join("tail.mp4");

    let trimmer = PreciseTrimmer::new(ffprobe(), Arc::new(FfmpegEncoder::default()));
    let clip = trimmer.trim(&source, &output, 8.0, 30.0).await.unwrap();
    assert!(clip.window.end <= 10.1);

    let trimmed = ffprobe().probe(&output).await.unwrap();
    assert!((trimmed.duration - 2.0).abs() <= 0.5);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_vertical_conversion_matches_computed_crop() {
    let dir = TempDir::new().unwrap();
    let source = test_source(&dir).await;
    let output = dir.path().join("vertical.mp4");

    let converter = AspectConverter::new(
        ffprobe(),
        VisualInterestAnalyzer::default(),
        Arc::new(FfmpegEncoder::default()),
    );
    let window = TimeWindow::new(0.0, 10.0).unwrap();
    let converted = converter
        .convert(&source, &output, TargetAspect::Vertical, window)
        .await
        .unwrap();

    let expected = compute_crop(
        640,
        360,
        TargetAspect::Vertical.ratio(),
        &converted.focal_point,
    );
    assert_eq!(converted.crop, Some(expected));
    assert!(!converted.copied);

    let result = ffprobe().probe(&output).await.unwrap();
    assert_eq!((result.width, result.height), (expected.width, expected.height));
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_garbage_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.mp4");
    tokio::fs::write(&path, b"not a video").await.unwrap();

    let err = ffprobe().probe(&path).await.unwrap_err();
    assert!(matches!(err, MediaError::ProbeFailed { .. }));
}

/// An executable that never exits.
///
/// Written once per test binary: exec of a file another thread still has
/// open for writing fails with ETXTBSY.
#[cfg(unix)]
fn hanging_tool() -> String {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::OnceLock;

    static TOOL: OnceLock<(TempDir, String)> = OnceLock::new();
    let (_, program) = TOOL.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hang.sh");
        std::fs::write(&path, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let program = path.to_string_lossy().to_string();
        (dir, program)
    });
    program.clone()
}

#[cfg(unix)]
#[tokio::test]
async fn test_hung_inspector_is_killed_on_timeout() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.mp4");
    tokio::fs::write(&source, vec![0u8; 2048]).await.unwrap();

    let inspector = FfprobeInspector::new()
        .with_program(hanging_tool())
        .with_timeout(1);
    let probe = DurationProbe::new(Arc::new(inspector));

    let started = Instant::now();
    let err = probe.probe(&source).await.unwrap_err();
    assert!(matches!(err, MediaError::ProbeFailed { .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[cfg(unix)]
#[tokio::test]
async fn test_hung_encoder_is_killed_on_timeout() {
    let dir = TempDir::new().unwrap();
    let cmd = FfmpegCommand::new(dir.path().join("in.mp4"), dir.path().join("out.mp4"));

    let runner = FfmpegRunner::new()
        .with_program(hanging_tool())
        .with_timeout(1);

    let started = Instant::now();
    let err = runner.run(&cmd).await.unwrap_err();
    assert!(matches!(err, MediaError::Timeout(1)), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}
