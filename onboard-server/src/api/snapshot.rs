//! Snapshot API Handlers
//!
//! Export returns the persisted document byte for byte; restore replaces the
//! board with a validated snapshot.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::header,
    response::IntoResponse,
};
use onboard_core::BoardError;
use serde::Serialize;

use crate::api::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RestoreSummary {
    pub batch_pipelines: usize,
    pub streaming_pipelines: usize,
    pub contacts: usize,
    pub issues: usize,
}

/// GET /export
pub async fn export_snapshot(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let snapshot = state.with_board(|board| board.export_snapshot()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"onboard.json\"",
            ),
        ],
        snapshot,
    ))
}

/// POST /restore
pub async fn restore_snapshot(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<RestoreSummary>> {
    let summary = state
        .with_board(move |board| {
            board.restore(&body)?;
            let document = board.document();
            Ok::<_, BoardError>(RestoreSummary {
                batch_pipelines: document.batch_pipelines.len(),
                streaming_pipelines: document.streaming_pipelines.len(),
                contacts: document.contacts.len(),
                issues: document.issues.len(),
            })
        })
        .await?;

    Ok(Json(summary))
}
