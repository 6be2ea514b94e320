//! FFprobe duration probing.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe the container duration of a video file in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_entries",
            "format=duration",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    parse_duration(&output.stdout).ok_or_else(|| {
        MediaError::InvalidVideo(format!("No usable duration for {}", path.display()))
    })
}

/// Extract a positive, finite duration from FFprobe's JSON output.
fn parse_duration(stdout: &[u8]) -> Option<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout).ok()?;
    let duration = probe.format?.duration?.trim().parse::<f64>().ok()?;
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        let out = br#"{"format": {"duration": "1000.040000"}}"#;
        assert!((parse_duration(out).unwrap() - 1000.04).abs() < 1e-9);
    }

    #[test]
    fn test_parse_duration_rejects_missing_or_invalid() {
        assert!(parse_duration(br#"{"format": {}}"#).is_none());
        assert!(parse_duration(br#"{}"#).is_none());
        assert!(parse_duration(br#"{"format": {"duration": "N/A"}}"#).is_none());
        assert!(parse_duration(br#"{"format": {"duration": "0.000000"}}"#).is_none());
        assert!(parse_duration(b"not json").is_none());
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_duration("/definitely/not/here.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
