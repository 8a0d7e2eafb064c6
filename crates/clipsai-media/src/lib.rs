//! Video transformation engine for ClipsAI.
//!
//! This crate provides:
//! - FFmpeg/FFprobe command wrappers behind the [`MediaEncoder`] and
//!   [`MediaInspector`] adapters
//! - Duration probing, precise trimming and aspect ratio conversion
//! - Visual interest analysis for crop placement
//! - Range-aware file streaming

pub mod analysis;
pub mod aspect;
pub mod command;
pub mod config;
pub mod encoder;
pub mod error;
pub mod fs_utils;
pub mod metrics;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod serve;
pub mod trim;

pub use analysis::{
    select_frame_analyzer, CenterFallbackAnalyzer, FrameAnalyzer, VisualInterestAnalyzer,
};
pub use aspect::{compute_crop, AspectConverter, ConvertedClip};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use config::{AnalysisConfig, EngineConfig};
pub use encoder::{EncodeJob, FfmpegEncoder, MediaEncoder};
pub use error::{MediaError, MediaResult};
pub use pipeline::{
    select_candidates, AutoClipJob, AutoClipResult, ClipEngine, ClipJob, RenderedClip,
    MAX_AUTO_CLIPS, NO_SPEECH_THRESHOLD,
};
pub use probe::{DurationProbe, FfprobeInspector, MediaFile, MediaInspector, VideoInfo};
pub use serve::{
    content_type_for, open_ranged, plan_response, serve_range, ByteRange, RangedFile, ServePlan,
    StreamOutcome, StreamStatus,
};
pub use trim::{PreciseTrimmer, TrimmedClip, MIN_OUTPUT_BYTES};
