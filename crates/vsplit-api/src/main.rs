//! Axum API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn};

use vsplit_api::logging::init_logging;
use vsplit_api::{create_router, metrics, ApiConfig, AppState, DiskCleanup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env();

    // Colored console output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);
    let _log_guards = init_logging(&config.log_dir, use_json)?;

    info!("Starting vsplit-api");
    info!(
        "API config: host={}, port={}, uploads={}, outputs={}",
        config.host,
        config.port,
        config.upload_dir.display(),
        config.output_dir.display()
    );

    if let Err(e) = vsplit_media::check_ffmpeg().and(vsplit_media::check_ffprobe()) {
        warn!("{}; uploads will fail until it is installed", e);
    }

    let state = AppState::new(config.clone())
        .await
        .context("Failed to create application state")?;

    // Initialize metrics
    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    let metrics_handle = if metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install Prometheus recorder")?)
    } else {
        None
    };

    // Start disk cleanup background task
    let cleanup = DiskCleanup::from_config(&config);
    tokio::spawn(async move {
        cleanup.run().await;
    });

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
