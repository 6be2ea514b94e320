//! Background service that deletes aged uploads and output directories.
//!
//! Each sweep:
//! - Removes output directories whose modification time is older than the threshold
//! - Removes upload files older than the threshold
//! - Logs every deletion and failure to the `cleanup` target and carries on

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::time::{interval_at, Instant};
use tracing::{error, info};

use crate::config::ApiConfig;
use crate::logging::CLEANUP_TARGET;
use crate::metrics;

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub outputs_deleted: u32,
    pub uploads_deleted: u32,
    pub failures: u32,
}

impl CleanupReport {
    pub fn deleted(&self) -> u32 {
        self.outputs_deleted + self.uploads_deleted
    }
}

/// Disk cleanup service.
pub struct DiskCleanup {
    upload_dir: PathBuf,
    output_dir: PathBuf,
    max_age: Duration,
    interval: Duration,
    enabled: bool,
}

impl DiskCleanup {
    pub fn new(upload_dir: PathBuf, output_dir: PathBuf, max_age: Duration, interval: Duration) -> Self {
        Self {
            upload_dir,
            output_dir,
            max_age,
            interval,
            enabled: true,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            enabled: config.cleanup_enabled,
            ..Self::new(
                config.upload_dir.clone(),
                config.output_dir.clone(),
                config.cleanup_max_age,
                config.cleanup_interval,
            )
        }
    }

    /// Start the background sweep loop.
    ///
    /// Runs indefinitely and should be spawned as a background task. The
    /// first sweep happens one interval after start.
    pub async fn run(&self) {
        if !self.enabled {
            info!(target: CLEANUP_TARGET, "Disk cleanup is disabled");
            return;
        }

        info!(
            target: CLEANUP_TARGET,
            max_age_secs = self.max_age.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Auto-cleanup started"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    /// Run a single sweep over both directories.
    pub async fn sweep(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        let now = SystemTime::now();

        self.sweep_dir(&self.output_dir, now, Kind::Output, &mut report).await;
        self.sweep_dir(&self.upload_dir, now, Kind::Upload, &mut report).await;

        if report.deleted() > 0 {
            info!(
                target: CLEANUP_TARGET,
                outputs = report.outputs_deleted,
                uploads = report.uploads_deleted,
                "Cleaned up {} old files/directories",
                report.deleted()
            );
            metrics::record_cleanup_deleted("output", report.outputs_deleted as u64);
            metrics::record_cleanup_deleted("upload", report.uploads_deleted as u64);
        }

        report
    }

    async fn sweep_dir(&self, dir: &Path, now: SystemTime, kind: Kind, report: &mut CleanupReport) {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                error!(target: CLEANUP_TARGET, dir = %dir.display(), "Error in cleanup process: {}", e);
                report.failures += 1;
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!(target: CLEANUP_TARGET, dir = %dir.display(), "Error reading directory: {}", e);
                    report.failures += 1;
                    break;
                }
            };

            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    error!(target: CLEANUP_TARGET, name = %name, "Error reading metadata: {}", e);
                    report.failures += 1;
                    continue;
                }
            };

            let matches_kind = match kind {
                Kind::Output => metadata.is_dir(),
                Kind::Upload => metadata.is_file(),
            };
            if !matches_kind || !is_older_than(&metadata, now, self.max_age) {
                continue;
            }

            let result = match kind {
                Kind::Output => tokio::fs::remove_dir_all(&path).await,
                Kind::Upload => tokio::fs::remove_file(&path).await,
            };

            match (result, kind) {
                (Ok(()), Kind::Output) => {
                    report.outputs_deleted += 1;
                    info!(target: CLEANUP_TARGET, "Deleted old output directory: {}", name);
                }
                (Ok(()), Kind::Upload) => {
                    report.uploads_deleted += 1;
                    info!(target: CLEANUP_TARGET, "Deleted old upload file: {}", name);
                }
                (Err(e), Kind::Output) => {
                    report.failures += 1;
                    error!(target: CLEANUP_TARGET, "Error deleting output {}: {}", name, e);
                }
                (Err(e), Kind::Upload) => {
                    report.failures += 1;
                    error!(target: CLEANUP_TARGET, "Error deleting upload {}: {}", name, e);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Output,
    Upload,
}

fn is_older_than(metadata: &std::fs::Metadata, now: SystemTime, max_age: Duration) -> bool {
    metadata
        .modified()
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .map(|age| age > max_age)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        let outputs = root.path().join("outputs");
        std::fs::create_dir_all(outputs.join("talk")).unwrap();
        std::fs::create_dir_all(&uploads).unwrap();
        std::fs::write(outputs.join("talk/talk_part000.mp4"), b"seg").unwrap();
        std::fs::write(uploads.join("abc_talk.mp4"), b"raw").unwrap();
        (root, uploads, outputs)
    }

    #[tokio::test]
    async fn test_sweep_removes_aged_entries() {
        let (_root, uploads, outputs) = fixture();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let cleanup = DiskCleanup::new(
            uploads.clone(),
            outputs.clone(),
            Duration::from_millis(10),
            Duration::from_secs(600),
        );
        let report = cleanup.sweep().await;

        assert_eq!(report.outputs_deleted, 1);
        assert_eq!(report.uploads_deleted, 1);
        assert_eq!(report.failures, 0);
        assert!(!outputs.join("talk").exists());
        assert!(!uploads.join("abc_talk.mp4").exists());
        // Roots themselves survive
        assert!(outputs.exists() && uploads.exists());
    }

    #[tokio::test]
    async fn test_sweep_keeps_recent_entries() {
        let (_root, uploads, outputs) = fixture();

        let cleanup = DiskCleanup::new(
            uploads.clone(),
            outputs.clone(),
            Duration::from_secs(7200),
            Duration::from_secs(600),
        );
        let report = cleanup.sweep().await;

        assert_eq!(report, CleanupReport::default());
        assert!(outputs.join("talk/talk_part000.mp4").exists());
        assert!(uploads.join("abc_talk.mp4").exists());
    }

    #[tokio::test]
    async fn test_sweep_tolerates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let cleanup = DiskCleanup::new(
            root.path().join("missing-uploads"),
            root.path().join("missing-outputs"),
            Duration::ZERO,
            Duration::from_secs(600),
        );

        assert_eq!(cleanup.sweep().await, CleanupReport::default());
    }

    #[tokio::test]
    async fn test_stray_entries_of_other_kind_are_ignored() {
        let (_root, uploads, outputs) = fixture();
        std::fs::write(outputs.join("loose.txt"), b"x").unwrap();
        std::fs::create_dir_all(uploads.join("nested")).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let cleanup = DiskCleanup::new(
            uploads.clone(),
            outputs.clone(),
            Duration::from_millis(10),
            Duration::from_secs(600),
        );
        cleanup.sweep().await;

        assert!(outputs.join("loose.txt").exists());
        assert!(uploads.join("nested").exists());
    }
}
