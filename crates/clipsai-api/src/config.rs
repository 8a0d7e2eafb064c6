//! API configuration.

use std::path::PathBuf;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Source videos, served under `/uploads`
    pub upload_dir: PathBuf,
    /// Finished clips, served under `/downloads`
    pub download_dir: PathBuf,
    /// Intermediate trims, never served
    pub temp_dir: PathBuf,
    /// Public scratch files, served under `/tmp`
    pub tmp_dir: PathBuf,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Test video copied into the upload directory at startup
    pub preloaded_video: Option<PathBuf>,
    /// Expose Prometheus metrics at `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            upload_dir: PathBuf::from("uploads"),
            download_dir: PathBuf::from("downloads"),
            temp_dir: PathBuf::from("temp"),
            tmp_dir: PathBuf::from("tmp"),
            cors_origins: vec!["*".to_string()],
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            preloaded_video: Some(PathBuf::from("test_vid.mp4")),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            upload_dir: env_path("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            download_dir: env_path("DOWNLOAD_DIR").unwrap_or(defaults.download_dir),
            temp_dir: env_path("TEMP_DIR").unwrap_or(defaults.temp_dir),
            tmp_dir: env_path("TMP_DIR").unwrap_or(defaults.tmp_dir),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            preloaded_video: match std::env::var("PRELOADED_VIDEO") {
                Ok(s) if s.trim().is_empty() => None,
                Ok(s) => Some(PathBuf::from(s)),
                Err(_) => defaults.preloaded_video,
            },
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Every directory the server writes to or serves from.
    pub fn directories(&self) -> [&PathBuf; 4] {
        [&self.upload_dir, &self.download_dir, &self.temp_dir, &self.tmp_dir]
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}
