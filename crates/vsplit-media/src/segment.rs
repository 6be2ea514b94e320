//! Stream-copy segmentation.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Build the segment-muxer command.
///
/// Streams are copied (no re-encode) and timestamps restart at zero in every
/// part. `output_pattern` carries a `%03d` placeholder for the part index.
pub fn segment_command(
    input: impl AsRef<Path>,
    output_pattern: impl AsRef<Path>,
    segment_duration: u32,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output_pattern)
        .stream_copy()
        .output_args([
            "-segment_time".to_string(),
            segment_duration.to_string(),
            "-f".to_string(),
            "segment".to_string(),
            "-reset_timestamps".to_string(),
            "1".to_string(),
        ])
}

/// Split `input` into parts of `segment_duration` seconds.
pub async fn split_into_segments(
    input: impl AsRef<Path>,
    output_pattern: impl AsRef<Path>,
    segment_duration: u32,
) -> MediaResult<()> {
    let cmd = segment_command(input, output_pattern, segment_duration);
    FfmpegRunner::new().run(&cmd).await
}
