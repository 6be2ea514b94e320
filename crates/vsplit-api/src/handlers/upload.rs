//! Video upload and segmentation handler.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use vsplit_models::encoding::is_valid_segment_duration;
use vsplit_models::{
    validate_identifier, JobId, SegmentationResult, SessionId, UploadRecord,
    DEFAULT_SEGMENT_DURATION,
};
use vsplit_worker::WorkerError;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::ClientIp;
use crate::security::{has_allowed_extension, invalid_extension_message, secure_filename, split_extension};
use crate::state::AppState;

/// Successful upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub data: SegmentationResult,
    /// Output directory name under the output root
    pub output_dir: String,
    pub session_id: SessionId,
    pub job_id: JobId,
}

/// A video part saved to the upload directory.
#[derive(Debug)]
struct SavedVideo {
    path: PathBuf,
    filename: String,
    size: u64,
}

/// Raw multipart fields.
#[derive(Debug, Default)]
struct UploadForm {
    video: Option<SavedVideo>,
    duration: Option<String>,
    session_id: Option<String>,
    job_id: Option<String>,
}

/// Everything the segmentation task needs.
struct UploadJob {
    job_id: JobId,
    session_id: SessionId,
    video: SavedVideo,
    base_name: String,
    output_dir: PathBuf,
    segment_duration: u32,
}

/// POST /upload
///
/// Saves the `video` part, splits it into `duration`-second segments and
/// answers once segmentation has finished. Progress for `job_id` can be
/// followed on `/progress/{job_id}` while this request is in flight.
pub async fn upload_video(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let client = client.map(|ip| ip.to_string());
    info!(client = ?client, "Upload request");

    let form = read_form(&state.config.upload_dir, &mut multipart).await?;
    let job = match prepare_job(&state, form) {
        Ok(job) => job,
        Err((e, video)) => {
            if let Some(video) = video {
                discard_upload(&video.path).await;
            }
            return Err(e);
        }
    };

    if !state.progress.try_claim(&job.job_id).await {
        discard_upload(&job.video.path).await;
        warn!(job_id = %job.job_id, "Rejected upload for a job that is still running");
        return Err(ApiError::conflict(format!(
            "Job {} is already running",
            job.job_id
        )));
    }

    state.sessions.get_or_create(&job.session_id, client).await;

    info!(
        job_id = %job.job_id,
        session_id = %job.session_id,
        filename = %job.video.filename,
        size = job.video.size,
        segment_duration = job.segment_duration,
        "Starting segmentation"
    );

    let job_id = job.job_id.clone();
    let upload_path = job.video.path.clone();
    let upload_size = job.video.size;
    let output_dir = job.output_dir.clone();
    let task = tokio::spawn(process_upload(state.clone(), job));

    match task.await {
        Ok(result) => result.map(Json),
        Err(join_error) => {
            error!(job_id = %job_id, "Segmentation task failed: {}", join_error);
            let err = WorkerError::internal(if join_error.is_panic() {
                "segmentation task panicked"
            } else {
                "segmentation task was cancelled"
            });
            state.processor.fail(&job_id, &err).await;
            state
                .progress
                .expire_after(job_id, state.config.worker.progress_retention);

            metrics::record_upload("error", upload_size);
            discard_upload(&upload_path).await;
            discard_outputs(&output_dir).await;
            Err(err.into())
        }
    }
}

/// Run segmentation for a claimed job and record the outcome.
///
/// The job claim is released and the progress entry scheduled for expiry
/// however this returns, including by panic.
async fn process_upload(state: AppState, job: UploadJob) -> ApiResult<UploadResponse> {
    let _claim = scopeguard::guard(
        (
            Arc::clone(&state.progress),
            job.job_id.clone(),
            state.config.worker.progress_retention,
        ),
        |(progress, job_id, retention)| {
            tokio::spawn(async move {
                progress.release(&job_id).await;
                progress.expire_after(job_id, retention);
            });
        },
    );

    let started = Instant::now();
    let outcome = match tokio::fs::create_dir_all(&job.output_dir).await {
        Ok(()) => {
            state
                .processor
                .run(
                    &job.video.path,
                    &job.output_dir,
                    &job.base_name,
                    job.segment_duration,
                    &job.job_id,
                )
                .await
        }
        Err(e) => {
            let err = WorkerError::from(e);
            state.processor.fail(&job.job_id, &err).await;
            Err(err)
        }
    };

    discard_upload(&job.video.path).await;

    match outcome {
        Ok(result) => {
            metrics::record_upload("completed", job.video.size);
            metrics::record_segmentation(result.files.len(), started.elapsed().as_secs_f64());

            state
                .sessions
                .record(
                    &job.session_id,
                    UploadRecord {
                        filename: job.video.filename.clone(),
                        timestamp: Utc::now(),
                        size: job.video.size,
                        output_dir: job.base_name.clone(),
                        num_segments: result.num_segments,
                        duration: result.original_duration,
                    },
                )
                .await;

            info!(
                job_id = %job.job_id,
                segments = result.files.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Video split successfully"
            );

            Ok(UploadResponse {
                success: true,
                message: "Video split successfully".to_string(),
                data: result,
                output_dir: job.base_name,
                session_id: job.session_id,
                job_id: job.job_id,
            })
        }
        Err(e) => {
            metrics::record_upload("error", job.video.size);
            error!(job_id = %job.job_id, "Segmentation failed: {}", e);

            discard_outputs(&job.output_dir).await;
            Err(e.into())
        }
    }
}

/// Validate the form and resolve identifiers.
///
/// On failure the saved video, if any, is handed back for removal.
fn prepare_job(
    state: &AppState,
    form: UploadForm,
) -> Result<UploadJob, (ApiError, Option<SavedVideo>)> {
    let UploadForm {
        video,
        duration,
        session_id,
        job_id,
    } = form;

    let Some(video) = video else {
        return Err((ApiError::bad_request("No file provided"), None));
    };

    let segment_duration = match parse_duration(duration.as_deref()) {
        Ok(d) => d,
        Err(e) => return Err((e, Some(video))),
    };

    let session_id = match resolve_identifier(session_id.as_deref()) {
        Ok(Some(id)) => SessionId::from_string(id),
        Ok(None) => SessionId::new(),
        Err(e) => return Err((e, Some(video))),
    };
    let job_id = match resolve_identifier(job_id.as_deref()) {
        Ok(Some(id)) => JobId::from_string(id),
        Ok(None) => JobId::new(),
        Err(e) => return Err((e, Some(video))),
    };

    let (base_name, _) = split_extension(&video.filename);
    let base_name = base_name.to_string();
    let output_dir = state.config.output_dir.join(&base_name);

    Ok(UploadJob {
        job_id,
        session_id,
        base_name,
        output_dir,
        segment_duration,
        video,
    })
}

/// Parse the `duration` field; absent or blank means the default.
fn parse_duration(raw: Option<&str>) -> ApiResult<u32> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_SEGMENT_DURATION),
        Some(raw) => raw,
    };

    let value: i64 = raw
        .parse()
        .map_err(|_| ApiError::bad_request("Duration must be a whole number of seconds"))?;

    if !is_valid_segment_duration(value) {
        return Err(ApiError::bad_request(
            "Duration must be between 1 second and 60 minutes (3600 seconds)",
        ));
    }
    Ok(value as u32)
}

/// Validate an optional client-supplied identifier. Blank counts as absent.
fn resolve_identifier(raw: Option<&str>) -> ApiResult<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => Ok(Some(validate_identifier(id)?.to_string())),
    }
}

/// Read every multipart field, streaming `video` to the upload directory.
///
/// If reading fails after the video was saved, the file is removed.
async fn read_form(upload_dir: &Path, multipart: &mut Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();
    if let Err(e) = read_fields(upload_dir, multipart, &mut form).await {
        if let Some(video) = form.video.take() {
            discard_upload(&video.path).await;
        }
        return Err(e);
    }
    Ok(form)
}

async fn read_fields(
    upload_dir: &Path,
    multipart: &mut Multipart,
    form: &mut UploadForm,
) -> ApiResult<()> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" if form.video.is_none() => {
                form.video = Some(save_video(upload_dir, field).await?);
            }
            "duration" => form.duration = Some(field.text().await?),
            "session_id" => form.session_id = Some(field.text().await?),
            "job_id" => form.job_id = Some(field.text().await?),
            _ => {}
        }
    }
    Ok(())
}

/// Validate the client filename, then stream the part to disk.
async fn save_video(upload_dir: &Path, mut field: Field<'_>) -> ApiResult<SavedVideo> {
    let original = field.file_name().unwrap_or_default().to_string();
    if original.trim().is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    if !has_allowed_extension(&original) {
        return Err(ApiError::bad_request(invalid_extension_message()));
    }

    let filename = secure_filename(&original);
    if !has_allowed_extension(&filename) {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let path = upload_dir.join(format!("{}_{}", uuid::Uuid::new_v4(), filename));
    let mut file = tokio::fs::File::create(&path).await?;
    let mut size = 0u64;

    let written: ApiResult<()> = async {
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    if let Err(e) = written {
        drop(file);
        discard_upload(&path).await;
        return Err(e);
    }

    Ok(SavedVideo {
        path,
        filename,
        size,
    })
}

/// Remove a failed job's output directory, warning when that fails.
async fn discard_outputs(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %dir.display(), "Could not remove output directory: {}", e);
        }
    }
}

/// Remove a transient upload, warning when that fails.
async fn discard_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "Could not delete upload file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration(None).unwrap(), 300);
        assert_eq!(parse_duration(Some("  ")).unwrap(), 300);
        assert_eq!(parse_duration(Some("60")).unwrap(), 60);
        assert_eq!(parse_duration(Some("3600")).unwrap(), 3600);
        assert!(matches!(parse_duration(Some("0")), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_duration(Some("3601")), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_duration(Some("-5")), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_duration(Some("ten")), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_resolve_identifier() {
        assert_eq!(resolve_identifier(None).unwrap(), None);
        assert_eq!(resolve_identifier(Some("")).unwrap(), None);
        assert_eq!(
            resolve_identifier(Some("job-42")).unwrap().as_deref(),
            Some("job-42")
        );
        assert!(resolve_identifier(Some("../etc")).is_err());
    }
}
