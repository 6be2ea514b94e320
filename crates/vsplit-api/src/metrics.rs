//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::LazyLock;
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vsplit_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vsplit_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vsplit_http_requests_in_flight";

    // Upload / segmentation metrics
    pub const UPLOADS_TOTAL: &str = "vsplit_uploads_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "vsplit_upload_bytes_total";
    pub const SEGMENTS_CREATED_TOTAL: &str = "vsplit_segments_created_total";
    pub const SEGMENTATION_DURATION_SECONDS: &str = "vsplit_segmentation_duration_seconds";

    // Progress stream metrics
    pub const PROGRESS_STREAMS_ACTIVE: &str = "vsplit_progress_streams_active";

    // Cleanup metrics
    pub const CLEANUP_DELETED_TOTAL: &str = "vsplit_cleanup_deleted_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vsplit_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished upload and its outcome (`completed` or `error`).
pub fn record_upload(outcome: &str, bytes: u64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::UPLOADS_TOTAL, &labels).increment(1);
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes);
}

/// Record a completed segmentation.
pub fn record_segmentation(segments: usize, duration_secs: f64) {
    counter!(names::SEGMENTS_CREATED_TOTAL).increment(segments as u64);
    histogram!(names::SEGMENTATION_DURATION_SECONDS).record(duration_secs);
}

/// Track a progress stream opening.
pub fn progress_stream_opened() {
    gauge!(names::PROGRESS_STREAMS_ACTIVE).increment(1.0);
}

/// Track a progress stream closing.
pub fn progress_stream_closed() {
    gauge!(names::PROGRESS_STREAMS_ACTIVE).decrement(1.0);
}

/// Record entries deleted by a cleanup sweep.
pub fn record_cleanup_deleted(kind: &str, count: u64) {
    let labels = [("kind", kind.to_string())];
    counter!(names::CLEANUP_DELETED_TOTAL, &labels).increment(count);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static UUID_SEGMENT: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("valid uuid regex")
});

static ID_ROUTES: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"^/(progress|history)/[^/]+$").expect("valid id route regex")
});

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    if path.starts_with("/download/") {
        return "/download/:filepath".to_string();
    }
    let path = UUID_SEGMENT.replace_all(path, ":id");
    ID_ROUTES.replace_all(&path, "/$1/:id").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/progress/550e8400-e29b-41d4-a716-446655440000"),
            "/progress/:id"
        );
        assert_eq!(sanitize_path("/history/browser-tab-7"), "/history/:id");
        assert_eq!(
            sanitize_path("/download/talk/talk_part000.mp4"),
            "/download/:filepath"
        );
        assert_eq!(sanitize_path("/list"), "/list");
    }
}
