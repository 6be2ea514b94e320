//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use vsplit_worker::WorkerConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Directory for transient uploaded files
    pub upload_dir: PathBuf,
    /// Root directory for per-video output folders
    pub output_dir: PathBuf,
    /// Directory for rolling log files
    pub log_dir: PathBuf,
    /// Max request body size
    pub max_upload_bytes: usize,
    /// Uploads allowed per client per hour
    pub upload_rate_limit_per_hour: u32,
    /// Requests allowed per client per hour, all routes
    pub global_rate_limit_per_hour: u32,
    /// Resolve clients from `X-Forwarded-For` / `X-Real-IP` instead of the
    /// socket peer. Only safe behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    /// Age after which uploads and outputs are swept
    pub cleanup_max_age: Duration,
    /// Interval between cleanup sweeps
    pub cleanup_interval: Duration,
    /// Whether the cleanup loop runs at all
    pub cleanup_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
    /// Progress stream and retention settings
    pub worker: WorkerConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            log_dir: PathBuf::from("logs"),
            max_upload_bytes: 2 * 1024 * 1024 * 1024, // 2GB
            upload_rate_limit_per_hour: 10,
            global_rate_limit_per_hour: 200,
            trust_proxy_headers: false,
            cleanup_max_age: Duration::from_secs(2 * 60 * 60),
            cleanup_interval: Duration::from_secs(10 * 60),
            cleanup_enabled: true,
            environment: "development".to_string(),
            worker: WorkerConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            log_dir: std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            upload_rate_limit_per_hour: env_parse("UPLOAD_RATE_LIMIT_PER_HOUR")
                .unwrap_or(defaults.upload_rate_limit_per_hour),
            global_rate_limit_per_hour: env_parse("GLOBAL_RATE_LIMIT_PER_HOUR")
                .unwrap_or(defaults.global_rate_limit_per_hour),
            trust_proxy_headers: std::env::var("TRUST_PROXY_HEADERS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.trust_proxy_headers),
            cleanup_max_age: env_parse("CLEANUP_MAX_AGE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_max_age),
            cleanup_interval: env_parse("CLEANUP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            cleanup_enabled: std::env::var("ENABLE_CLEANUP")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.cleanup_enabled),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            worker: WorkerConfig::from_env(),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.upload_rate_limit_per_hour, 10);
        assert_eq!(config.global_rate_limit_per_hour, 200);
        assert!(!config.trust_proxy_headers);
        assert_eq!(config.cleanup_max_age, Duration::from_secs(7200));
        assert_eq!(config.cleanup_interval, Duration::from_secs(600));
        assert!(!config.is_production());
    }
}
