//! Focal point produced by visual interest analysis.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Normalized position in a frame deemed most visually significant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FocalPoint {
    /// Horizontal position (0.0 = left, 1.0 = right)
    pub center_x: f64,
    /// Vertical position (0.0 = top, 1.0 = bottom)
    pub center_y: f64,
    /// How much the analysis trusts this point (0.0 to 1.0)
    pub confidence: f64,
}

/// Confidence reported when analysis ran but found no faces.
pub const NO_FACES_CONFIDENCE: f64 = 0.1;

impl FocalPoint {
    /// Create a focal point, clamping every component into `[0, 1]`.
    pub fn new(center_x: f64, center_y: f64, confidence: f64) -> Self {
        Self {
            center_x: unit(center_x, 0.5),
            center_y: unit(center_y, 0.5),
            confidence: unit(confidence, 0.0),
        }
    }

    /// Frame center with the given confidence.
    pub fn center(confidence: f64) -> Self {
        Self::new(0.5, 0.5, confidence)
    }

    /// Result when frame-level analysis is not available at all.
    pub fn unavailable() -> Self {
        Self::center(0.0)
    }

    /// Result when analysis ran but no face was found in any sample.
    pub fn no_faces() -> Self {
        Self::center(NO_FACES_CONFIDENCE)
    }
}

impl Default for FocalPoint {
    fn default() -> Self {
        Self::unavailable()
    }
}

fn unit(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}
