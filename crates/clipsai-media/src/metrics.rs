//! Engine metrics. A recorder is installed by the binary; without one these are no-ops.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FFMPEG_DURATION_SECONDS: &str = "clipsai_ffmpeg_duration_seconds";
    pub const CLIPS_RENDERED_TOTAL: &str = "clipsai_clips_rendered_total";
    pub const CLIPS_FAILED_TOTAL: &str = "clipsai_clips_failed_total";
    pub const STREAMS_TOTAL: &str = "clipsai_streams_total";
    pub const STREAM_BYTES_TOTAL: &str = "clipsai_stream_bytes_total";
}

/// Record one FFmpeg invocation.
pub fn record_ffmpeg_duration(duration_secs: f64, success: bool) {
    let labels = [("success", success.to_string())];
    histogram!(names::FFMPEG_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a rendered clip.
pub fn record_clip_rendered(aspect: &str) {
    let labels = [("aspect", aspect.to_string())];
    counter!(names::CLIPS_RENDERED_TOTAL, &labels).increment(1);
}

/// Record a clip that failed to render.
pub fn record_clip_failed(kind: &'static str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::CLIPS_FAILED_TOTAL, &labels).increment(1);
}

/// Record the end of a file stream.
pub fn record_stream(status: &'static str, bytes: u64) {
    let labels = [("status", status.to_string())];
    counter!(names::STREAMS_TOTAL, &labels).increment(1);
    counter!(names::STREAM_BYTES_TOTAL).increment(bytes);
}
