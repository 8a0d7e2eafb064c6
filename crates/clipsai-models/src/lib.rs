//! Shared data models for the ClipsAI media backend.
//!
//! This crate provides Serde-serializable types for:
//! - Trim windows, focal points and crop rectangles
//! - Target aspect ratios
//! - Encoding configuration
//! - Transcript segments and auto-clip candidates
//! - HTTP request/response bodies

pub mod api;
pub mod encoding;
pub mod focal;
pub mod rect;
pub mod style;
pub mod transcript;
pub mod window;

// Re-export common types
pub use api::{
    FindClipsRequest, FindClipsResponse, GeneratedClip, PreloadedVideo, PreloadedVideoResponse,
    TrimClipRequest, TrimClipResponse,
};
pub use encoding::EncodingConfig;
pub use focal::FocalPoint;
pub use rect::CropRect;
pub use style::{AspectRequest, TargetAspect};
pub use transcript::{ClipCandidate, TranscriptSegment};
pub use window::{TimeWindow, WindowError};
