//! Segmentation and thumbnail settings.

/// Default segment length in seconds (5 minutes).
pub const DEFAULT_SEGMENT_DURATION: u32 = 300;
/// Shortest accepted segment length in seconds.
pub const MIN_SEGMENT_DURATION: u32 = 1;
/// Longest accepted segment length in seconds (60 minutes).
pub const MAX_SEGMENT_DURATION: u32 = 3600;
/// Upper bound on parts produced from one upload.
pub const MAX_SEGMENTS: u32 = 100_000;

/// Video container extensions accepted for upload (lowercase, no dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mov", "mkv", "flv", "wmv", "webm", "mpeg", "mpg",
];

/// Thumbnail generation settings
pub const THUMBNAIL_SCALE_WIDTH: u32 = 320;
pub const THUMBNAIL_MAX_OFFSET_SECS: f64 = 1.0;
pub const THUMBNAIL_SUFFIX: &str = "_thumb.jpg";

/// Check whether a segment length lies in the accepted range.
pub fn is_valid_segment_duration(seconds: i64) -> bool {
    (MIN_SEGMENT_DURATION as i64..=MAX_SEGMENT_DURATION as i64).contains(&seconds)
}

/// Check whether an extension (with or without a leading dot) is accepted.
pub fn is_allowed_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_duration_bounds() {
        assert!(!is_valid_segment_duration(0));
        assert!(is_valid_segment_duration(1));
        assert!(is_valid_segment_duration(300));
        assert!(is_valid_segment_duration(3600));
        assert!(!is_valid_segment_duration(3601));
        assert!(!is_valid_segment_duration(-5));
    }

    #[test]
    fn test_allowed_extensions() {
        assert!(is_allowed_extension("mp4"));
        assert!(is_allowed_extension(".MKV"));
        assert!(is_allowed_extension("mpg"));
        assert!(!is_allowed_extension("txt"));
        assert!(!is_allowed_extension(""));
    }
}
