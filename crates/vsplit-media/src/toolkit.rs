//! Pluggable access to the external media tool.

use std::path::Path;

use async_trait::async_trait;

use crate::error::MediaResult;
use crate::{generate_thumbnail, probe_duration, split_into_segments};

/// Operations the segmentation workflow needs from the media tool.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Duration of `input` in seconds. Fails on a non-positive or unparseable value.
    async fn probe_duration(&self, input: &Path) -> MediaResult<f64>;

    /// Split `input` into `segment_duration`-second parts named by `output_pattern`.
    async fn split(&self, input: &Path, output_pattern: &Path, segment_duration: u32)
        -> MediaResult<()>;

    /// Write a single-frame thumbnail of `video` to `output`.
    async fn thumbnail(&self, video: &Path, output: &Path, offset_secs: f64) -> MediaResult<()>;
}

/// [`MediaToolkit`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegToolkit;

impl FfmpegToolkit {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_duration(&self, input: &Path) -> MediaResult<f64> {
        probe_duration(input).await
    }

    async fn split(
        &self,
        input: &Path,
        output_pattern: &Path,
        segment_duration: u32,
    ) -> MediaResult<()> {
        split_into_segments(input, output_pattern, segment_duration).await
    }

    async fn thumbnail(&self, video: &Path, output: &Path, offset_secs: f64) -> MediaResult<()> {
        generate_thumbnail(video, output, offset_secs).await
    }
}
