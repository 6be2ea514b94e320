//! Worker error types.
//!
//! The `Display` text of each variant is what the progress stream and the
//! upload response show to the client.

use thiserror::Error;
use vsplit_media::MediaError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to get video duration")]
    ProbeFailed(#[source] MediaError),

    #[error("FFmpeg error: {}", .0.diagnostic())]
    SplitFailed(#[source] MediaError),

    #[error("Invalid segmentation request: {0}")]
    InvalidRequest(String),

    #[error(
        "Video too long to split: {duration:.0}s at {segment_duration}s per part exceeds {max} parts"
    )]
    TooManySegments {
        duration: f64,
        segment_duration: u32,
        max: u32,
    },

    #[error("Error splitting video: {0}")]
    Media(#[from] MediaError),

    #[error("Error splitting video: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error splitting video: {0}")]
    Internal(String),
}

impl WorkerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the external media tool reported the failure.
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, WorkerError::ProbeFailed(_) | WorkerError::SplitFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_failure_surfaces_stderr() {
        let err = WorkerError::SplitFailed(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("Unknown encoder\n".into()),
            Some(1),
        ));
        assert_eq!(err.to_string(), "FFmpeg error: Unknown encoder");
        assert!(err.is_tool_failure());
    }

    #[test]
    fn test_probe_failure_message() {
        let err = WorkerError::ProbeFailed(MediaError::InvalidVideo("no duration".into()));
        assert_eq!(err.to_string(), "Failed to get video duration");
    }

    #[test]
    fn test_too_many_segments_message() {
        let err = WorkerError::TooManySegments {
            duration: 1.0e6,
            segment_duration: 1,
            max: 100_000,
        };
        assert_eq!(
            err.to_string(),
            "Video too long to split: 1000000s at 1s per part exceeds 100000 parts"
        );
        assert!(!err.is_tool_failure());
    }

    #[test]
    fn test_unexpected_error_message() {
        let err = WorkerError::internal("task panicked");
        assert_eq!(err.to_string(), "Error splitting video: task panicked");
        assert!(!err.is_tool_failure());
    }
}
