//! Frame sampling and focal point selection.
//!
//! Everything here is independent of the image library so the heuristic can
//! be tested without decoding video.

use clipsai_models::{FocalPoint, TimeWindow};

/// Base score contributed by a detected face.
pub const FACE_BASE_SCORE: f64 = 1.0;

/// Score needed for full confidence.
pub const FULL_CONFIDENCE_SCORE: f64 = 3.0;

/// A detected face in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    #[inline]
    pub fn cy(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Signals measured on one sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSignals {
    pub frame_width: u32,
    pub frame_height: u32,
    pub faces: Vec<FaceRegion>,
    /// Mean gradient magnitude normalized to `[0, 1]`
    pub motion: f64,
    /// Fraction of edge pixels
    pub edges: f64,
}

/// Scale a mean gradient magnitude of 8-bit pixels into `[0, 1]`.
///
/// A 3x3 Sobel magnitude can reach about 1442, so strong texture saturates
/// at 1.
pub fn normalized_motion(mean_magnitude: f64) -> f64 {
    if !mean_magnitude.is_finite() {
        return 0.0;
    }
    (mean_magnitude / 255.0).clamp(0.0, 1.0)
}

/// Frame indices to sample across `window` at `fps`.
///
/// The stride is `max(1, frame_count / sample_count)`, so roughly
/// `sample_count` evenly spaced frames are returned, starting at the first
/// frame of the window.
pub fn sample_frame_indices(fps: f64, window: TimeWindow, sample_count: usize) -> Vec<u64> {
    if !fps.is_finite() || fps <= 0.0 {
        return Vec::new();
    }

    let start_frame = (window.start.max(0.0) * fps) as u64;
    let end_frame = (window.end.max(0.0) * fps) as u64;
    if end_frame <= start_frame {
        return Vec::new();
    }

    let stride = ((end_frame - start_frame) / sample_count.max(1) as u64).max(1);
    (start_frame..end_frame).step_by(stride as usize).collect()
}

/// Pick the most interesting face across all sampled frames.
///
/// Every face scores `1 + motion + edges` of its frame. The first maximum in
/// sampling order wins. Without any face the frame center is returned with
/// [`FocalPoint::no_faces`] confidence.
pub fn select_focal_point(samples: &[FrameSignals]) -> FocalPoint {
    let mut best: Option<(f64, f64, f64)> = None;

    for sample in samples {
        if sample.frame_width == 0 || sample.frame_height == 0 {
            continue;
        }
        let score = FACE_BASE_SCORE + sample.motion + sample.edges;

        for face in &sample.faces {
            let x = face.cx() / sample.frame_width as f64;
            let y = face.cy() / sample.frame_height as f64;

            // Strictly greater keeps the first maximum
            if best.map_or(true, |(_, _, s)| score > s) {
                best = Some((x, y, score));
            }
        }
    }

    match best {
        Some((x, y, score)) => FocalPoint::new(x, y, (score / FULL_CONFIDENCE_SCORE).min(1.0)),
        None => FocalPoint::no_faces(),
    }
}
