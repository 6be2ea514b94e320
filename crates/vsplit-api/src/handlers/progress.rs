//! Server-Sent Events stream of job progress.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{Stream, StreamExt};
use tracing::debug;

use vsplit_models::{validate_identifier, JobId, StreamEvent};
use vsplit_worker::progress_stream;

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

/// GET /progress/{job_id}
///
/// One `data:` line per changed snapshot. The stream closes after the
/// terminal snapshot, or after a single `{"status":"timeout"}` event.
/// Closing it has no effect on the job.
pub async fn progress_events(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let job_id = JobId::from_string(validate_identifier(&job_id)?);
    debug!(job_id = %job_id, "Progress stream opened");

    metrics::progress_stream_opened();
    let open = scopeguard::guard(job_id.clone(), |job_id| {
        metrics::progress_stream_closed();
        debug!(job_id = %job_id, "Progress stream closed");
    });

    let settings = state.config.worker.stream_settings();
    let stream = progress_stream(state.progress.clone(), job_id, settings).map(move |event| {
        let _open = &open;
        to_sse_event(&event)
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

fn to_sse_event(event: &StreamEvent) -> Result<Event, axum::Error> {
    Event::default().json_data(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsplit_models::ProgressSnapshot;

    #[test]
    fn test_snapshot_event_serializes() {
        let snapshot = ProgressSnapshot::processing(10, "Splitting video...");
        assert!(to_sse_event(&StreamEvent::Snapshot(snapshot)).is_ok());
        assert!(to_sse_event(&StreamEvent::timeout()).is_ok());
    }
}
