//! Segmentation orchestration.
//!
//! Drives one upload through probe -> split -> enumerate -> thumbnails and
//! publishes a [`ProgressSnapshot`] at every milestone.

use std::path::Path;
use std::sync::Arc;

use tracing::Instrument;

use vsplit_media::MediaToolkit;
use vsplit_models::encoding::{MAX_SEGMENTS, THUMBNAIL_MAX_OFFSET_SECS};
use vsplit_models::segment::{
    round2, segment_count, segment_file_name, segment_pattern, thumbnail_file_name,
};
use vsplit_models::{JobId, ProgressSnapshot, SegmentDescriptor, SegmentationResult};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::SegmentationLog;
use crate::progress::ProgressStore;

/// Percent published once the splitter is about to run.
const SPLIT_START_PERCENT: u32 = 10;
/// Percent reached after the last segment is enumerated.
const SEGMENTS_DONE_PERCENT: u32 = 95;

/// Runs segmentation jobs and reports their progress.
#[derive(Clone)]
pub struct SegmentationProcessor {
    toolkit: Arc<dyn MediaToolkit>,
    progress: Arc<ProgressStore>,
}

impl SegmentationProcessor {
    /// Create a new processor.
    pub fn new(toolkit: Arc<dyn MediaToolkit>, progress: Arc<ProgressStore>) -> Self {
        Self { toolkit, progress }
    }

    /// Split `input` into `segment_duration`-second parts inside `output_dir`.
    ///
    /// Every failure is published as a terminal `error` snapshot before it is
    /// returned. Files already written to `output_dir` are left for the caller.
    pub async fn run(
        &self,
        input: &Path,
        output_dir: &Path,
        base_name: &str,
        segment_duration: u32,
        job_id: &JobId,
    ) -> WorkerResult<SegmentationResult> {
        let log = SegmentationLog::new(job_id, base_name, segment_duration);
        let span = log.span();

        async {
            log.started(input);

            match self
                .execute(input, output_dir, base_name, segment_duration, job_id, &log)
                .await
            {
                Ok(result) => {
                    log.finished(result.files.len(), result.num_segments);
                    Ok(result)
                }
                Err(e) => {
                    log.failed(&e);
                    self.fail(job_id, &e).await;
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Publish the terminal error snapshot for a failed job.
    pub async fn fail(&self, job_id: &JobId, error: &WorkerError) {
        self.publish(job_id, ProgressSnapshot::error(error.to_string()))
            .await;
    }

    async fn execute(
        &self,
        input: &Path,
        output_dir: &Path,
        base_name: &str,
        segment_duration: u32,
        job_id: &JobId,
        log: &SegmentationLog,
    ) -> WorkerResult<SegmentationResult> {
        if segment_duration == 0 {
            return Err(WorkerError::invalid_request("segment duration must be positive"));
        }

        self.publish(job_id, ProgressSnapshot::processing(0, "Analyzing video..."))
            .await;

        let duration = self
            .toolkit
            .probe_duration(input)
            .await
            .map_err(WorkerError::ProbeFailed)?;

        let num_segments = segment_count(duration, segment_duration).ok_or(
            WorkerError::TooManySegments {
                duration,
                segment_duration,
                max: MAX_SEGMENTS,
            },
        )?;
        log.probed(duration, num_segments);
        self.publish(
            job_id,
            ProgressSnapshot::processing(5, format!("Will create {} parts...", num_segments))
                .with_parts(0, num_segments),
        )
        .await;

        let ext = input
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let pattern = output_dir.join(segment_pattern(base_name, &ext));

        self.publish(
            job_id,
            ProgressSnapshot::processing(SPLIT_START_PERCENT as u8, "Splitting video..."),
        )
        .await;
        self.toolkit
            .split(input, &pattern, segment_duration)
            .await
            .map_err(WorkerError::SplitFailed)?;

        let mut files = Vec::new();
        for index in 0..num_segments {
            let filename = segment_file_name(base_name, index, &ext);
            let path = output_dir.join(&filename);

            let size = match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => metadata.len(),
                _ => {
                    log.part_missing(index, &filename);
                    continue;
                }
            };

            let thumb_name = thumbnail_file_name(base_name, index);
            let offset = thumbnail_offset(duration, segment_duration, index);
            let thumbnail = match self
                .toolkit
                .thumbnail(&path, &output_dir.join(&thumb_name), offset)
                .await
            {
                Ok(()) => Some(thumb_name),
                Err(e) => {
                    log.thumbnail_failed(index, &e);
                    None
                }
            };

            log.part_done(index, size, thumbnail.is_some());
            files.push(SegmentDescriptor::new(filename, size, thumbnail));

            self.publish(
                job_id,
                ProgressSnapshot::processing(
                    part_percent(index + 1, num_segments),
                    format!("Processing part {} of {}...", index + 1, num_segments),
                )
                .with_parts(index + 1, num_segments),
            )
            .await;
        }

        self.publish(
            job_id,
            ProgressSnapshot::completed("Video split completed!")
                .with_parts(num_segments, num_segments),
        )
        .await;

        Ok(SegmentationResult {
            original_duration: round2(duration),
            num_segments,
            segment_duration,
            files,
        })
    }

    async fn publish(&self, job_id: &JobId, snapshot: ProgressSnapshot) {
        self.progress.write(job_id, snapshot).await;
    }
}

/// Percent after `done` of `total` segments, interpolated from 10 to 95.
fn part_percent(done: u32, total: u32) -> u8 {
    if total == 0 {
        return SEGMENTS_DONE_PERCENT as u8;
    }
    let span = SEGMENTS_DONE_PERCENT - SPLIT_START_PERCENT;
    (SPLIT_START_PERCENT + span * done.min(total) / total) as u8
}

/// Seek offset for a segment's thumbnail: near its start, inside its span.
fn thumbnail_offset(duration: f64, segment_duration: u32, index: u32) -> f64 {
    let start = segment_duration as f64 * index as f64;
    let span = (duration - start).min(segment_duration as f64).max(0.0);
    THUMBNAIL_MAX_OFFSET_SECS.min(span / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use vsplit_media::{MediaError, MediaResult};
    use vsplit_models::JobStatus;

    /// Fake media tool that writes placeholder files.
    #[derive(Default)]
    struct FakeToolkit {
        duration: Option<f64>,
        split_error: Option<String>,
        skip_segments: HashSet<u32>,
        failing_thumbnails: HashSet<u32>,
        thumbnail_offsets: Mutex<Vec<f64>>,
    }

    #[async_trait]
    impl MediaToolkit for FakeToolkit {
        async fn probe_duration(&self, _input: &Path) -> MediaResult<f64> {
            self.duration
                .ok_or_else(|| MediaError::InvalidVideo("no duration".into()))
        }

        async fn split(
            &self,
            _input: &Path,
            output_pattern: &Path,
            segment_duration: u32,
        ) -> MediaResult<()> {
            if let Some(stderr) = &self.split_error {
                return Err(MediaError::ffmpeg_failed(
                    "FFmpeg exited with non-zero status",
                    Some(stderr.clone()),
                    Some(1),
                ));
            }
            let duration = self.duration.unwrap_or_default();
            let pattern = output_pattern.to_string_lossy().to_string();
            for index in 0..segment_count(duration, segment_duration).unwrap_or(0) {
                if self.skip_segments.contains(&index) {
                    continue;
                }
                let path = PathBuf::from(pattern.replace("%03d", &format!("{:03}", index)));
                std::fs::write(path, vec![0u8; 1024 * (index as usize + 1)])?;
            }
            Ok(())
        }

        async fn thumbnail(&self, video: &Path, output: &Path, offset_secs: f64) -> MediaResult<()> {
            self.thumbnail_offsets.lock().unwrap().push(offset_secs);
            let name = video.file_name().unwrap().to_string_lossy().to_string();
            let failing = self
                .failing_thumbnails
                .iter()
                .any(|i| name.contains(&format!("_part{:03}", i)));
            if failing {
                return Err(MediaError::ffmpeg_failed("thumbnail failed", None, Some(1)));
            }
            std::fs::write(output, b"jpg")?;
            Ok(())
        }
    }

    struct Harness {
        processor: SegmentationProcessor,
        store: Arc<ProgressStore>,
        dir: tempfile::TempDir,
        input: PathBuf,
    }

    fn harness(toolkit: FakeToolkit) -> Harness {
        let store = Arc::new(ProgressStore::new());
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("talk.mp4");
        std::fs::write(&input, b"video").unwrap();
        Harness {
            processor: SegmentationProcessor::new(Arc::new(toolkit), Arc::clone(&store)),
            store,
            dir,
            input,
        }
    }

    /// Record every distinct snapshot written for `job` until the run finishes.
    async fn run_and_watch(
        h: &Harness,
        segment_duration: u32,
        job: &JobId,
    ) -> (WorkerResult<SegmentationResult>, Vec<ProgressSnapshot>) {
        let watcher = {
            let store = Arc::clone(&h.store);
            let job = job.clone();
            tokio::spawn(async move {
                let mut seen: Vec<ProgressSnapshot> = Vec::new();
                loop {
                    if let Some(s) = store.read(&job).await {
                        if seen.last() != Some(&s) {
                            let terminal = s.is_terminal();
                            seen.push(s);
                            if terminal {
                                return seen;
                            }
                        }
                    }
                    tokio::task::yield_now().await;
                }
            })
        };
        let result = h
            .processor
            .run(&h.input, h.dir.path(), "talk", segment_duration, job)
            .await;
        (result, watcher.await.unwrap())
    }

    #[tokio::test]
    async fn test_splits_into_ceil_segments() {
        let h = harness(FakeToolkit {
            duration: Some(1000.0),
            ..Default::default()
        });
        let job = JobId::from_string("job-1");

        let result = h
            .processor
            .run(&h.input, h.dir.path(), "talk", 300, &job)
            .await
            .unwrap();

        assert_eq!(result.num_segments, 4);
        assert_eq!(result.segment_duration, 300);
        assert_eq!(result.original_duration, 1000.0);
        let names: Vec<_> = result.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(
            names,
            ["talk_part000.mp4", "talk_part001.mp4", "talk_part002.mp4", "talk_part003.mp4"]
        );
        assert_eq!(result.files[1].size, 2048);
        assert_eq!(
            result.files[3].thumbnail.as_deref(),
            Some("talk_part003_thumb.jpg")
        );

        let last = h.store.read(&job).await.unwrap();
        assert_eq!(last.status, JobStatus::Completed);
        assert_eq!(last.percent, 100);
        assert_eq!(last.message, "Video split completed!");
        assert_eq!((last.current_part, last.total_parts), (Some(4), Some(4)));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        let h = harness(FakeToolkit {
            duration: Some(1000.0),
            ..Default::default()
        });
        let job = JobId::from_string("job-mono");

        let (result, seen) = run_and_watch(&h, 300, &job).await;
        assert!(result.is_ok());

        assert!(seen.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert_eq!(seen.last().unwrap().percent, 100);
        assert_eq!(seen.iter().filter(|s| s.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn test_missing_segment_is_dropped() {
        let h = harness(FakeToolkit {
            duration: Some(1000.0),
            skip_segments: HashSet::from([3]),
            ..Default::default()
        });

        let result = h
            .processor
            .run(&h.input, h.dir.path(), "talk", 300, &JobId::new())
            .await
            .unwrap();

        assert_eq!(result.num_segments, 4);
        assert_eq!(result.files.len(), 3);
        assert!(result.files.iter().all(|f| f.filename != "talk_part003.mp4"));
    }

    #[tokio::test]
    async fn test_thumbnail_failure_degrades_descriptor() {
        let h = harness(FakeToolkit {
            duration: Some(600.0),
            failing_thumbnails: HashSet::from([0]),
            ..Default::default()
        });
        let job = JobId::new();

        let result = h
            .processor
            .run(&h.input, h.dir.path(), "talk", 300, &job)
            .await
            .unwrap();

        assert_eq!(result.files.len(), 2);
        assert!(result.files[0].thumbnail.is_none());
        assert!(result.files[1].thumbnail.is_some());
        assert_eq!(h.store.read(&job).await.unwrap().status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_probe_failure_publishes_error() {
        let h = harness(FakeToolkit::default());
        let job = JobId::from_string("job-probe");

        let err = h
            .processor
            .run(&h.input, h.dir.path(), "talk", 300, &job)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::ProbeFailed(_)));
        let last = h.store.read(&job).await.unwrap();
        assert_eq!(last.status, JobStatus::Error);
        assert_eq!(last.percent, 0);
        assert_eq!(last.message, "Failed to get video duration");
    }

    #[tokio::test]
    async fn test_split_failure_surfaces_tool_text() {
        let h = harness(FakeToolkit {
            duration: Some(120.0),
            split_error: Some("moov atom not found\n".into()),
            ..Default::default()
        });
        let job = JobId::from_string("job-split");

        let (result, seen) = run_and_watch(&h, 60, &job).await;

        assert!(matches!(result, Err(WorkerError::SplitFailed(_))));
        let last = seen.last().unwrap();
        assert_eq!(last.status, JobStatus::Error);
        assert_eq!(last.message, "FFmpeg error: moov atom not found");
        assert_ne!(last.percent, 100);
    }

    #[tokio::test]
    async fn test_absurd_duration_is_rejected_before_splitting() {
        let h = harness(FakeToolkit {
            duration: Some(1.0e12),
            ..Default::default()
        });
        let job = JobId::from_string("job-huge");

        let err = h
            .processor
            .run(&h.input, h.dir.path(), "talk", 1, &job)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::TooManySegments { max: MAX_SEGMENTS, .. }));
        let last = h.store.read(&job).await.unwrap();
        assert_eq!(last.status, JobStatus::Error);
        assert!(last.message.starts_with("Video too long to split"));
        // Nothing was handed to the splitter
        let written: Vec<_> = std::fs::read_dir(h.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(written, vec![std::ffi::OsString::from("talk.mp4")]);
    }

    #[test]
    fn test_part_percent() {
        assert_eq!(part_percent(1, 4), 31);
        assert_eq!(part_percent(2, 4), 52);
        assert_eq!(part_percent(4, 4), 95);
        assert_eq!(part_percent(1, 1), 95);
    }

    #[test]
    fn test_thumbnail_offset_stays_inside_segment() {
        assert_eq!(thumbnail_offset(1000.0, 300, 0), 1.0);
        // Last segment spans 100s
        assert_eq!(thumbnail_offset(1000.0, 300, 3), 1.0);
        // A 0.8s tail segment seeks to its middle
        assert!((thumbnail_offset(300.8, 300, 1) - 0.4).abs() < 1e-9);
        assert!((thumbnail_offset(0.5, 300, 0) - 0.25).abs() < 1e-9);
    }
}
