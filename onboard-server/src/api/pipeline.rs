//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management. Records are addressed by kind and
//! case-insensitive name.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use onboard_core::domain::pipeline::{Pipeline, PipelineKind};

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

pub(crate) fn parse_kind(kind: &str) -> ApiResult<PipelineKind> {
    kind.parse().map_err(ApiError::BadRequest)
}

/// GET /pipeline/{kind}/list
pub async fn list_pipelines(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<Vec<Pipeline>>> {
    let kind = parse_kind(&kind)?;
    tracing::debug!("Listing {} pipelines", kind);

    let board = state.board.lock().await;
    Ok(Json(board.document().pipelines(kind).to_vec()))
}

/// POST /pipeline/{kind}/create
pub async fn create_pipeline(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(pipeline): Json<Pipeline>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    let kind = parse_kind(&kind)?;
    if pipeline.kind() != kind {
        return Err(ApiError::BadRequest(format!(
            "pipeline '{}' is {} but was posted as {}",
            pipeline.name(),
            pipeline.kind(),
            kind
        )));
    }
    tracing::info!("Creating {} pipeline: {}", kind, pipeline.name());

    let stored = pipeline.clone();
    state.with_board(move |board| board.add_pipeline(stored)).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /pipeline/{kind}/{name}
pub async fn get_pipeline(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> ApiResult<Json<Pipeline>> {
    let kind = parse_kind(&kind)?;
    tracing::debug!("Getting {} pipeline: {}", kind, name);

    let board = state.board.lock().await;
    board
        .document()
        .find_pipeline(kind, &name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("{} pipeline '{}' not found", kind, name)))
}

/// PUT /pipeline/{kind}/{name}
/// Replace the whole record
pub async fn replace_pipeline(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    Json(pipeline): Json<Pipeline>,
) -> ApiResult<Json<Pipeline>> {
    let kind = parse_kind(&kind)?;
    tracing::info!("Replacing {} pipeline: {}", kind, name);

    let stored = pipeline.clone();
    state
        .with_board(move |board| board.replace_pipeline(kind, &name, stored))
        .await?;

    Ok(Json(pipeline))
}

/// DELETE /pipeline/{kind}/{name}
pub async fn delete_pipeline(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind = parse_kind(&kind)?;
    tracing::info!("Deleting {} pipeline: {}", kind, name);

    state
        .with_board(move |board| board.remove_pipeline(kind, &name))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
