//! Application state.

use std::sync::Arc;

use vsplit_media::{FfmpegToolkit, MediaToolkit};
use vsplit_worker::{ProgressStore, SegmentationProcessor};

use crate::config::ApiConfig;
use crate::services::SessionLedger;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub progress: Arc<ProgressStore>,
    pub sessions: Arc<SessionLedger>,
    pub processor: SegmentationProcessor,
}

impl AppState {
    /// Create application state backed by the system FFmpeg.
    pub async fn new(config: ApiConfig) -> std::io::Result<Self> {
        Self::with_toolkit(config, Arc::new(FfmpegToolkit::new())).await
    }

    /// Create application state with a specific media toolkit.
    ///
    /// Creates the upload and output directories if missing.
    pub async fn with_toolkit(
        config: ApiConfig,
        toolkit: Arc<dyn MediaToolkit>,
    ) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&config.upload_dir).await?;
        tokio::fs::create_dir_all(&config.output_dir).await?;

        let progress = Arc::new(ProgressStore::new());
        let processor = SegmentationProcessor::new(toolkit, Arc::clone(&progress));

        Ok(Self {
            config,
            progress,
            sessions: Arc::new(SessionLedger::new()),
            processor,
        })
    }
}
