//! Thumbnail generation.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use vsplit_models::encoding::THUMBNAIL_SCALE_WIDTH;

/// Build the single-frame capture command.
pub fn thumbnail_command(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    offset_secs: f64,
) -> FfmpegCommand {
    let filter = format!("scale={}:-2", THUMBNAIL_SCALE_WIDTH);

    FfmpegCommand::new(video_path, output_path)
        .seek(offset_secs.max(0.0))
        .single_frame()
        .video_filter(filter)
        .log_level("error")
}

/// Capture one frame `offset_secs` into `video_path`, 320px wide.
pub async fn generate_thumbnail(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    offset_secs: f64,
) -> MediaResult<()> {
    let cmd = thumbnail_command(video_path, output_path, offset_secs);
    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_filter() {
        let args = thumbnail_command("part.mp4", "part_thumb.jpg", 1.0).build_args();
        assert!(args.contains(&"scale=320:-2".to_string()));
        assert!(args.contains(&"1.000".to_string()));
    }

    #[test]
    fn test_negative_offset_is_clamped() {
        let args = thumbnail_command("part.mp4", "part_thumb.jpg", -3.0).build_args();
        assert!(args.contains(&"0.000".to_string()));
    }
}
