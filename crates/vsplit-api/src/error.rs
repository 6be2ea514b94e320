//! API error types.

use axum::extract::multipart::MultipartError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vsplit_models::IdentifierError;
use vsplit_worker::WorkerError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Upload rejected for exceeding `limit_bytes`.
    pub fn payload_too_large(limit_bytes: usize) -> Self {
        Self::PayloadTooLarge(format!(
            "File too large. Maximum upload size is {}",
            format_size(limit_bytes)
        ))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Worker(WorkerError::InvalidRequest(_))
            | ApiError::Worker(WorkerError::TooManySegments { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Worker(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::RateLimited => "rate_limited",
            ApiError::Worker(WorkerError::InvalidRequest(_))
            | ApiError::Worker(WorkerError::TooManySegments { .. }) => "bad_request",
            ApiError::Worker(e) if e.is_tool_failure() => "media_tool_failed",
            ApiError::Internal(_) | ApiError::Worker(_) | ApiError::Io(_) => "internal",
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            // Rewritten with the configured limit by the upload route
            ApiError::PayloadTooLarge("File too large".to_string())
        } else {
            ApiError::BadRequest(format!("Invalid upload: {}", e.body_text()))
        }
    }
}

impl From<IdentifierError> for ApiError {
    fn from(e: IdentifierError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

fn format_size(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    const GB: usize = 1024 * MB;
    if bytes >= GB && bytes % GB == 0 {
        format!("{} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{} MB", bytes / MB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Response extension marking an `error` text that carries internal detail.
///
/// [`crate::middleware::hide_internal_errors`] replaces such bodies in
/// production.
#[derive(Debug, Clone, Copy)]
pub struct InternalDetail;

/// Generic 500 body used in place of internal detail.
pub(crate) fn redacted_internal_error() -> Response {
    let body = ErrorResponse {
        error: "An internal error occurred".to_string(),
        code: Some("internal"),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            code: Some(self.code()),
        };

        if matches!(self, ApiError::RateLimited) {
            return (status, [(header::RETRY_AFTER, "3600")], Json(body)).into_response();
        }

        let mut response = (status, Json(body)).into_response();
        // Tool diagnostics are part of the contract; other internals are not
        if matches!(self, ApiError::Internal(_) | ApiError::Io(_)) {
            response.extensions_mut().insert(InternalDetail);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsplit_media::MediaError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::from(WorkerError::invalid_request("x")).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_payload_too_large_message() {
        let err = ApiError::payload_too_large(2 * 1024 * 1024 * 1024);
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_string(), "File too large. Maximum upload size is 2 GB");
        assert_eq!(
            ApiError::payload_too_large(64).to_string(),
            "File too large. Maximum upload size is 64 bytes"
        );
        assert_eq!(format_size(500 * 1024 * 1024), "500 MB");
    }

    #[test]
    fn test_only_internal_errors_are_marked() {
        let response = ApiError::internal("disk on fire").into_response();
        assert!(response.extensions().get::<InternalDetail>().is_some());

        let response = ApiError::from(WorkerError::internal("task panicked")).into_response();
        assert!(response.extensions().get::<InternalDetail>().is_none());
    }

    #[test]
    fn test_too_many_segments_is_client_error() {
        let err = ApiError::from(WorkerError::TooManySegments {
            duration: 1.0e12,
            segment_duration: 1,
            max: 100_000,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "bad_request");
    }

    #[test]
    fn test_tool_failure_keeps_diagnostic() {
        let err = ApiError::from(WorkerError::SplitFailed(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("Invalid data found".to_string()),
            Some(1),
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "media_tool_failed");
        assert_eq!(err.to_string(), "FFmpeg error: Invalid data found");
    }
}
