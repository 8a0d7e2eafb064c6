//! Engine configuration.

use std::path::PathBuf;

use crate::encoder::DEFAULT_ENCODE_TIMEOUT_SECS;
use crate::probe::DEFAULT_PROBE_TIMEOUT_SECS;

/// Cascade used when `FACE_CASCADE_PATH` is not set.
pub const DEFAULT_FACE_CASCADE: &str =
    "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml";

/// Frame analysis settings.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Turn frame analysis off even when it is compiled in
    pub enabled: bool,
    /// Haar cascade for frontal faces
    pub face_cascade_path: PathBuf,
    /// Number of frames sampled per window
    pub sample_count: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            face_cascade_path: PathBuf::from(DEFAULT_FACE_CASCADE),
            sample_count: 10,
        }
    }
}

/// Settings for the external tools driven by the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub probe_timeout_secs: u64,
    pub encode_timeout_secs: u64,
    pub analysis: AnalysisConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            encode_timeout_secs: DEFAULT_ENCODE_TIMEOUT_SECS,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            probe_timeout_secs: std::env::var("PROBE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.probe_timeout_secs),
            encode_timeout_secs: std::env::var("ENCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.encode_timeout_secs),
            analysis: AnalysisConfig {
                enabled: std::env::var("VISUAL_ANALYSIS")
                    .map(|s| parse_flag(&s))
                    .unwrap_or(true),
                face_cascade_path: std::env::var("FACE_CASCADE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.analysis.face_cascade_path),
                sample_count: defaults.analysis.sample_count,
            },
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "off" | "no" | "disabled"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.probe_timeout_secs, 30);
        assert_eq!(config.encode_timeout_secs, 300);
        assert!(config.analysis.enabled);
        assert_eq!(config.analysis.sample_count, 10);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("Off"));
        assert!(!parse_flag(" false "));
    }
}
