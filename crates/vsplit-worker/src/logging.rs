//! Structured logging for segmentation runs.
//!
//! Every event is emitted inside a `segmentation` span carrying the job ID,
//! the output base name and the requested part length, so one upload can be
//! followed through `app.log` with a single filter.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, info, warn, Span};
use vsplit_models::JobId;

/// Logger for one segmentation run.
#[derive(Debug)]
pub struct SegmentationLog {
    span: Span,
    started: Instant,
}

impl SegmentationLog {
    pub fn new(job_id: &JobId, base_name: &str, segment_duration: u32) -> Self {
        let span = tracing::info_span!(
            "segmentation",
            job_id = %job_id,
            base_name = %base_name,
            segment_duration,
            parts = tracing::field::Empty,
        );
        Self {
            span,
            started: Instant::now(),
        }
    }

    /// Span the run should be instrumented with.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn started(&self, input: &Path) {
        info!(input = %input.display(), "Segmentation started");
    }

    /// Record the probed duration and the part count derived from it.
    pub fn probed(&self, duration: f64, parts: u32) {
        self.span.record("parts", parts);
        info!(duration_secs = duration, parts, "Probed video duration");
    }

    pub fn part_missing(&self, index: u32, filename: &str) {
        warn!(part = index, filename, "Expected part was not created");
    }

    pub fn thumbnail_failed(&self, index: u32, error: &dyn std::fmt::Display) {
        warn!(part = index, error = %error, "Thumbnail generation failed");
    }

    pub fn part_done(&self, index: u32, size: u64, has_thumbnail: bool) {
        debug!(part = index, size, has_thumbnail, "Part ready");
    }

    pub fn finished(&self, written: usize, expected: u32) {
        info!(
            written,
            expected,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Segmentation completed"
        );
    }

    pub fn failed(&self, error: &dyn std::fmt::Display) {
        error!(
            error = %error,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Segmentation failed"
        );
    }
}
