//! Worker configuration.

use std::time::Duration;

use crate::publisher::StreamSettings;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often a progress stream re-reads the store
    pub progress_poll_interval: Duration,
    /// Ceiling after which a progress stream gives up
    pub progress_stream_timeout: Duration,
    /// How long a terminal snapshot stays readable after the job ends
    pub progress_retention: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            progress_poll_interval: Duration::from_millis(500),
            progress_stream_timeout: Duration::from_secs(300), // 5 minutes
            progress_retention: Duration::from_secs(10),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            progress_poll_interval: Duration::from_millis(
                std::env::var("PROGRESS_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            ),
            progress_stream_timeout: Duration::from_secs(
                std::env::var("PROGRESS_STREAM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            progress_retention: Duration::from_secs(
                std::env::var("PROGRESS_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }

    /// Settings for progress stream publishers.
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            poll_interval: self.progress_poll_interval,
            max_duration: self.progress_stream_timeout,
        }
    }
}
