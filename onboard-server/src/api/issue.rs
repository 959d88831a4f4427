//! Issue API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{Local, NaiveDate};
use onboard_core::domain::issue::{Issue, IssueStatus};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIssue {
    pub title: String,
    pub linked_pipeline: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to today
    pub opened_date: Option<NaiveDate>,
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub blocked_days: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIssueStatus {
    pub status: IssueStatus,
    pub blocked_days: Option<u32>,
}

fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest(format!("invalid issue id '{}'", id)))
}

/// GET /issue
pub async fn list_issues(State(state): State<AppState>) -> ApiResult<Json<Vec<Issue>>> {
    let board = state.board.lock().await;
    Ok(Json(board.document().issues.clone()))
}

/// POST /issue
pub async fn create_issue(
    State(state): State<AppState>,
    Json(req): Json<CreateIssue>,
) -> ApiResult<(StatusCode, Json<Issue>)> {
    let mut issue = Issue::new(
        req.title,
        req.linked_pipeline,
        req.opened_date
            .unwrap_or_else(|| Local::now().date_naive()),
    );
    issue.description = req.description;
    issue.status = req.status.unwrap_or(IssueStatus::Open);
    issue.blocked_days = req.blocked_days;
    tracing::info!("Creating issue: {}", issue.title);

    let stored = issue.clone();
    state.with_board(move |board| board.add_issue(stored)).await?;

    Ok((StatusCode::CREATED, Json(issue)))
}

/// POST /issue/{id}/status
pub async fn update_issue_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateIssueStatus>,
) -> ApiResult<Json<Issue>> {
    let id = parse_id(&id)?;
    tracing::info!("Setting issue {} to {}", id, req.status);

    let issue = state
        .with_board(move |board| board.set_issue_status(id, req.status, req.blocked_days))
        .await?;

    Ok(Json(issue))
}

/// DELETE /issue/{id}
pub async fn delete_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    tracing::info!("Deleting issue: {}", id);

    state.with_board(move |board| board.remove_issue(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
