//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    clear_outputs, download_file, get_history, health, list_outputs, progress_events, ready,
    upload_video,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, hide_internal_errors, payload_too_large_json, rate_limit_middleware, request_id,
    request_logging, security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let trust_proxy = state.config.trust_proxy_headers;
    let upload_limiter = Arc::new(
        RateLimiterCache::per_hour(state.config.upload_rate_limit_per_hour)
            .trusting_proxy_headers(trust_proxy),
    );
    let global_limiter = Arc::new(
        RateLimiterCache::per_hour(state.config.global_rate_limit_per_hour)
            .trusting_proxy_headers(trust_proxy),
    );

    // Multipart bodies are bounded by the explicit limit layer, not axum's default
    let upload_routes = Router::new()
        .route("/upload", post(upload_video))
        .layer(middleware::from_fn_with_state(
            upload_limiter,
            rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            state.config.max_upload_bytes,
            payload_too_large_json,
        ));

    let job_routes = Router::new()
        .route("/progress/:job_id", get(progress_events))
        .route("/history/:session_id", get(get_history));

    let output_routes = Router::new()
        .route("/list", get(list_outputs))
        .route("/download/*filepath", get(download_file))
        .route("/clear", post(clear_outputs));

    let api_routes = Router::new()
        .merge(upload_routes)
        .merge(job_routes)
        .merge(output_routes)
        .layer(middleware::from_fn_with_state(
            global_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(
            state.config.is_production(),
            hide_internal_errors,
        ))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
