//! Progress snapshots for segmentation jobs.
//!
//! A snapshot is the single current value the orchestrator publishes for a
//! job. Readers (the progress stream) compare whole snapshots to decide
//! whether anything changed, so the timestamp is part of equality.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Job processing status as seen by progress stream clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is actively being processed
    #[default]
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Error,
    /// The progress stream gave up waiting (never stored)
    Timeout,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
            JobStatus::Timeout => "timeout",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable progress record for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressSnapshot {
    /// Progress percentage (0-100)
    pub percent: u8,
    /// Human-readable step description
    pub message: String,
    /// Current status
    pub status: JobStatus,
    /// 1-based index of the part being processed
    pub current_part: Option<u32>,
    /// Total number of parts
    pub total_parts: Option<u32>,
    /// When the snapshot was captured
    pub timestamp: DateTime<Utc>,
}

impl ProgressSnapshot {
    /// Create a snapshot with the given status.
    pub fn new(percent: u8, message: impl Into<String>, status: JobStatus) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
            status,
            current_part: None,
            total_parts: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a `processing` snapshot.
    pub fn processing(percent: u8, message: impl Into<String>) -> Self {
        Self::new(percent, message, JobStatus::Processing)
    }

    /// Create the terminal success snapshot.
    pub fn completed(message: impl Into<String>) -> Self {
        Self::new(100, message, JobStatus::Completed)
    }

    /// Create the terminal failure snapshot. Failures always report 0%.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(0, message, JobStatus::Error)
    }

    /// Attach part counters.
    pub fn with_parts(mut self, current: u32, total: u32) -> Self {
        self.current_part = Some(current);
        self.total_parts = Some(total);
        self
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One event delivered on a progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// A snapshot that differs from the previously delivered one
    Snapshot(ProgressSnapshot),
    /// The stream hit its time ceiling before the job finished
    Timeout { status: JobStatus },
}

impl StreamEvent {
    /// Synthetic timeout event.
    pub fn timeout() -> Self {
        Self::Timeout {
            status: JobStatus::Timeout,
        }
    }

    /// Whether the stream ends after this event.
    pub fn is_final(&self) -> bool {
        match self {
            StreamEvent::Snapshot(snapshot) => snapshot.is_terminal(),
            StreamEvent::Timeout { .. } => true,
        }
    }
}
