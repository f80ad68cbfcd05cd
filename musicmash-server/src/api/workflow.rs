//! Workflow editor endpoints

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::auth::MaybeSession;
use crate::editor::{CommandOutcome, EditorCommand, EditorError, EditorView};
use crate::workflow::{export::content_disposition, export::export_document, GraphError};
use crate::{ApiError, ApiResult, AppState};

impl From<EditorError> for ApiError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::Graph(e @ GraphError::DuplicateTrack(_)) => ApiError::Conflict(e.to_string()),
            EditorError::Graph(e @ (GraphError::UnknownNode(_) | GraphError::UnknownEdge(_))) => {
                ApiError::NotFound(e.to_string())
            }
            EditorError::Graph(e @ GraphError::MainNodeProtected) => ApiError::Forbidden(e.to_string()),
            EditorError::ConfirmationRequired => ApiError::BadRequest(err.to_string()),
            EditorError::Persistence(e) => ApiError::Common(e),
        }
    }
}

/// GET /api/workflow
///
/// Canvas plus side list. Without a session the side list is empty.
pub async fn get_workflow(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Json<EditorView> {
    let available = match session {
        Some(session) => session.feed.tracks().await,
        None => Vec::new(),
    };
    Json(state.editor.view(&available).await)
}

/// POST /api/workflow/commands
pub async fn post_command(
    State(state): State<AppState>,
    Json(command): Json<EditorCommand>,
) -> ApiResult<Json<CommandOutcome>> {
    let outcome = state.editor.dispatch(command).await?;
    Ok(Json(outcome))
}

/// GET /api/workflow/export
///
/// Downloads the current graph as a timestamped JSON document.
pub async fn export_workflow(State(state): State<AppState>) -> ApiResult<Response> {
    let snapshot = state.editor.snapshot().await;
    let document = export_document(snapshot, Utc::now())?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition()),
        ],
        document,
    )
        .into_response())
}
