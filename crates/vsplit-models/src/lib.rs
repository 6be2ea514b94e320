//! Shared data models for the vsplit backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job and session identifiers
//! - Progress snapshots published while a video is being split
//! - Segment descriptors and segmentation results
//! - Per-session upload history
//! - Segmentation and thumbnail constants

pub mod encoding;
pub mod job;
pub mod progress;
pub mod segment;
pub mod session;
pub mod utils;

// Re-export common types
pub use encoding::{
    ALLOWED_EXTENSIONS, DEFAULT_SEGMENT_DURATION, MAX_SEGMENT_DURATION, MIN_SEGMENT_DURATION,
};
pub use job::{JobId, SessionId};
pub use progress::{JobStatus, ProgressSnapshot, StreamEvent};
pub use segment::{SegmentDescriptor, SegmentationResult};
pub use session::{SessionRecord, UploadRecord, MAX_SESSION_UPLOADS};
pub use utils::{validate_identifier, IdentifierError};
