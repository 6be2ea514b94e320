//! Output listing, download and clearing.

use std::path::{Path as FsPath, PathBuf};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tower_http::services::ServeFile;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::security::is_safe_relative_path;
use crate::state::AppState;

/// One file inside an output directory.
#[derive(Debug, Serialize)]
pub struct OutputFile {
    pub filename: String,
    pub size: u64,
    /// Path relative to the output root, usable with `/download`
    pub path: String,
}

/// One output directory.
#[derive(Debug, Serialize)]
pub struct OutputEntry {
    pub name: String,
    pub files: Vec<OutputFile>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ListOutputsResponse {
    pub outputs: Vec<OutputEntry>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
}

/// GET /list
pub async fn list_outputs(State(state): State<AppState>) -> ApiResult<Json<ListOutputsResponse>> {
    let outputs = scan_outputs(&state.config.output_dir).await?;
    Ok(Json(ListOutputsResponse { outputs }))
}

/// Output directories and their files, both sorted by name.
async fn scan_outputs(root: &FsPath) -> std::io::Result<Vec<OutputEntry>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut outputs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();

        let mut files = Vec::new();
        let mut dir = tokio::fs::read_dir(entry.path()).await?;
        while let Some(file) = dir.next_entry().await? {
            let metadata = file.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let filename = file.file_name().to_string_lossy().to_string();
            files.push(OutputFile {
                path: format!("{}/{}", name, filename),
                filename,
                size: metadata.len(),
            });
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));

        outputs.push(OutputEntry {
            count: files.len(),
            name,
            files,
        });
    }
    outputs.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(outputs)
}

/// GET /download/{*filepath}
///
/// Serves a file from the output root as an attachment.
pub async fn download_file(
    State(state): State<AppState>,
    Path(filepath): Path<String>,
) -> ApiResult<Response> {
    if !is_safe_relative_path(&filepath) {
        warn!(filepath = %filepath, "Rejected download path");
        return Err(ApiError::bad_request("Invalid file path"));
    }

    let path: PathBuf = state.config.output_dir.join(&filepath);
    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(ApiError::not_found("File not found"));
    }

    let request = Request::builder()
        .body(Body::empty())
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let mut response = match ServeFile::new(&path).try_call(request).await {
        Ok(response) => response.into_response(),
        Err(e) => return Err(ApiError::internal(format!("Failed to serve file: {}", e))),
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_default();
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);

    Ok(response)
}

/// POST /clear
///
/// Deletes every output directory. Jobs still writing are not stopped.
pub async fn clear_outputs(State(state): State<AppState>) -> ApiResult<Json<ClearResponse>> {
    let root = &state.config.output_dir;
    match tokio::fs::remove_dir_all(root).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    tokio::fs::create_dir_all(root).await?;

    info!("All outputs cleared");
    Ok(Json(ClearResponse {
        success: true,
        message: "All outputs cleared".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_outputs_sorted() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("zeta")).unwrap();
        std::fs::create_dir_all(root.path().join("alpha")).unwrap();
        std::fs::write(root.path().join("alpha/alpha_part001.mp4"), b"12").unwrap();
        std::fs::write(root.path().join("alpha/alpha_part000.mp4"), b"1").unwrap();
        std::fs::write(root.path().join("stray.txt"), b"x").unwrap();

        let outputs = scan_outputs(root.path()).await.unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].name, "alpha");
        assert_eq!(outputs[0].count, 2);
        assert_eq!(outputs[0].files[0].filename, "alpha_part000.mp4");
        assert_eq!(outputs[0].files[0].path, "alpha/alpha_part000.mp4");
        assert_eq!(outputs[0].files[1].size, 2);
        assert_eq!(outputs[1].name, "zeta");
        assert_eq!(outputs[1].count, 0);
    }

    #[tokio::test]
    async fn test_scan_missing_root_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let outputs = scan_outputs(&root.path().join("missing")).await.unwrap();
        assert!(outputs.is_empty());
    }
}
