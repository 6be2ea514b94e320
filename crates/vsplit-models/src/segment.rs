//! Segment descriptors and segmentation results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::encoding::{MAX_SEGMENTS, THUMBNAIL_SUFFIX};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One output file produced by the splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentDescriptor {
    /// Segment filename inside the output directory
    pub filename: String,
    /// Size in bytes
    pub size: u64,
    /// Size in MiB, rounded to 2 decimals
    pub size_mb: f64,
    /// Thumbnail filename, absent if generation failed
    pub thumbnail: Option<String>,
}

impl SegmentDescriptor {
    /// Create a descriptor from a file name and its size on disk.
    pub fn new(filename: impl Into<String>, size: u64, thumbnail: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            size,
            size_mb: round2(size as f64 / BYTES_PER_MB),
            thumbnail,
        }
    }
}

/// Outcome of splitting one uploaded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentationResult {
    /// Probed source duration in seconds, rounded to 2 decimals
    pub original_duration: f64,
    /// Number of segments the duration arithmetic calls for
    pub num_segments: u32,
    /// Requested segment length in seconds
    pub segment_duration: u32,
    /// Segments found on disk, in index order
    pub files: Vec<SegmentDescriptor>,
}

/// Number of segments needed to cover `duration` seconds.
///
/// Returns `None` when the count exceeds [`MAX_SEGMENTS`], which also covers
/// an infinite duration.
pub fn segment_count(duration: f64, segment_duration: u32) -> Option<u32> {
    if !(duration > 0.0) || segment_duration == 0 {
        return Some(0);
    }
    let count = (duration / segment_duration as f64).ceil();
    if count > MAX_SEGMENTS as f64 {
        return None;
    }
    Some(count as u32)
}

/// Filename of segment `index`: `{base}_part{NNN}{ext}`.
///
/// `ext` includes the leading dot (or is empty).
pub fn segment_file_name(base_name: &str, index: u32, ext: &str) -> String {
    format!("{}_part{:03}{}", base_name, index, ext)
}

/// Thumbnail filename for segment `index`: `{base}_part{NNN}_thumb.jpg`.
pub fn thumbnail_file_name(base_name: &str, index: u32) -> String {
    format!("{}_part{:03}{}", base_name, index, THUMBNAIL_SUFFIX)
}

/// Output pattern handed to the segment muxer (`%03d` index placeholder).
pub fn segment_pattern(base_name: &str, ext: &str) -> String {
    format!("{}_part%03d{}", base_name, ext)
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_count() {
        assert_eq!(segment_count(1000.0, 300), Some(4));
        assert_eq!(segment_count(900.0, 300), Some(3));
        assert_eq!(segment_count(900.01, 300), Some(4));
        assert_eq!(segment_count(0.5, 3600), Some(1));
        assert_eq!(segment_count(0.0, 300), Some(0));
        assert_eq!(segment_count(f64::NAN, 300), Some(0));
    }

    #[test]
    fn test_segment_count_rejects_oversized_durations() {
        assert_eq!(segment_count(MAX_SEGMENTS as f64, 1), Some(MAX_SEGMENTS));
        assert_eq!(segment_count(MAX_SEGMENTS as f64 + 0.5, 1), None);
        assert_eq!(segment_count(1.0e12, 1), None);
        assert_eq!(segment_count(f64::INFINITY, 300), None);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(segment_file_name("talk", 0, ".mp4"), "talk_part000.mp4");
        assert_eq!(segment_file_name("talk", 12, ".mkv"), "talk_part012.mkv");
        assert_eq!(thumbnail_file_name("talk", 3), "talk_part003_thumb.jpg");
        assert_eq!(segment_pattern("talk", ".mov"), "talk_part%03d.mov");
    }

    #[test]
    fn test_descriptor_size_mb() {
        let descriptor = SegmentDescriptor::new("a_part000.mp4", 5 * 1024 * 1024 + 123_456, None);
        assert_eq!(descriptor.size_mb, 5.12);
        assert!(descriptor.thumbnail.is_none());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1000.123), 1000.12);
        assert_eq!(round2(12.345_6), 12.35);
    }
}
