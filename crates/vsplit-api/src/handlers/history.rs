//! Per-session upload history.

use axum::extract::{Path, State};
use axum::Json;

use vsplit_models::{validate_identifier, SessionId, SessionRecord};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /history/{session_id}
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionRecord>> {
    let session_id = SessionId::from_string(validate_identifier(&session_id)?);
    state
        .sessions
        .get(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Session not found"))
}
