//! Target aspect ratio definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aspect ratios a clip can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum TargetAspect {
    /// Landscape 16:9
    #[default]
    #[serde(rename = "16:9")]
    Widescreen,
    /// Portrait 9:16 for TikTok/Reels/Shorts
    #[serde(rename = "9:16")]
    Vertical,
    /// Square 1:1
    #[serde(rename = "1:1")]
    Square,
}

impl TargetAspect {
    pub const ALL: &'static [TargetAspect] = &[
        TargetAspect::Widescreen,
        TargetAspect::Vertical,
        TargetAspect::Square,
    ];

    /// Width and height terms of the ratio.
    pub const fn dimensions(&self) -> (u32, u32) {
        match self {
            TargetAspect::Widescreen => (16, 9),
            TargetAspect::Vertical => (9, 16),
            TargetAspect::Square => (1, 1),
        }
    }

    /// Returns the aspect ratio as a decimal (width / height).
    pub fn ratio(&self) -> f64 {
        let (w, h) = self.dimensions();
        w as f64 / h as f64
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetAspect::Widescreen => "16:9",
            TargetAspect::Vertical => "9:16",
            TargetAspect::Square => "1:1",
        }
    }

    /// Parse a user-supplied value. Unrecognized input falls back to widescreen.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "16:9" | "widescreen" | "landscape" => TargetAspect::Widescreen,
            "9:16" | "vertical" | "portrait" => TargetAspect::Vertical,
            "1:1" | "square" => TargetAspect::Square,
            _ => TargetAspect::Widescreen,
        }
    }
}

impl fmt::Display for TargetAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the caller asked for: keep the trimmed clip as is, or convert it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRequest {
    Original,
    Convert(TargetAspect),
}

impl AspectRequest {
    pub fn target(&self) -> Option<TargetAspect> {
        match self {
            AspectRequest::Original => None,
            AspectRequest::Convert(aspect) => Some(*aspect),
        }
    }
}

impl Default for AspectRequest {
    fn default() -> Self {
        AspectRequest::Convert(TargetAspect::Widescreen)
    }
}

impl fmt::Display for AspectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectRequest::Original => write!(f, "original"),
            AspectRequest::Convert(aspect) => write!(f, "{aspect}"),
        }
    }
}

impl FromStr for AspectRequest {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("original") {
            Ok(AspectRequest::Original)
        } else {
            Ok(AspectRequest::Convert(TargetAspect::parse_lenient(s)))
        }
    }
}
