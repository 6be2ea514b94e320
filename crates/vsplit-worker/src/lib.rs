//! Segmentation worker.
//!
//! This crate provides:
//! - The job progress store shared by uploads and progress streams
//! - The progress stream publisher (poll, de-duplicate, time out)
//! - The segmentation orchestrator (probe, split, enumerate, thumbnail)
//! - Structured job logging

pub mod config;
pub mod error;
pub mod logging;
pub mod processor;
pub mod progress;
pub mod publisher;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::SegmentationLog;
pub use processor::SegmentationProcessor;
pub use progress::ProgressStore;
pub use publisher::{progress_stream, StreamSettings};
