//! Transcript segments and the auto-clip candidates derived from them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One segment of a transcript as produced by the speech-to-text collaborator.
///
/// Unknown fields (tokens, log-probabilities, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Segment start in seconds
    pub start: f64,
    /// Segment end in seconds
    pub end: f64,
    /// Spoken text
    #[serde(default)]
    pub text: String,
    /// Probability that the segment contains no speech
    #[serde(default)]
    pub no_speech_prob: f64,
}

/// A transcript segment selected for automatic clip generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipCandidate {
    /// Position of the source segment in the transcript
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// `1 - no_speech_prob`
    pub confidence: f64,
}

impl ClipCandidate {
    pub fn from_segment(index: usize, segment: &TranscriptSegment) -> Self {
        Self {
            index,
            start: segment.start,
            end: segment.end,
            text: segment.text.clone(),
            confidence: (1.0 - segment.no_speech_prob).clamp(0.0, 1.0),
        }
    }
}
