//! Trim window definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A `[start, end)` interval in seconds selected from a source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeWindow {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds (exclusive)
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    #[error("Invalid time range: {start} >= {end}")]
    StartNotBeforeEnd { start: f64, end: f64 },

    #[error("Time range contains a non-finite value")]
    NotFinite,

    #[error("Invalid clip duration after clamping to {duration:.3}s: {clip_duration:.3}s")]
    EmptyAfterClamp { duration: f64, clip_duration: f64 },
}

impl TimeWindow {
    /// Create a window, rejecting `start >= end` and NaN/infinite bounds.
    pub fn new(start: f64, end: f64) -> Result<Self, WindowError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(WindowError::NotFinite);
        }
        if start >= end {
            return Err(WindowError::StartNotBeforeEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering `[0, duration)`.
    pub fn from_duration(duration: f64) -> Result<Self, WindowError> {
        Self::new(0.0, duration)
    }

    /// Length of the window in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Clamp both bounds into `[0, media_duration]`.
    ///
    /// Fails when nothing of the window survives the clamp.
    pub fn clamp_to(&self, media_duration: f64) -> Result<TimeWindow, WindowError> {
        let start = self.start.max(0.0);
        let end = self.end.min(media_duration);
        let clip_duration = end - start;

        if clip_duration <= 0.0 || !clip_duration.is_finite() {
            return Err(WindowError::EmptyAfterClamp {
                duration: media_duration,
                clip_duration,
            });
        }

        Ok(TimeWindow { start, end })
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s)", self.start, self.end)
    }
}
