//! Ingestion API Handler
//!
//! Accepts a CSV or xlsx body, answers with the per-row outcome, and appends the
//! accepted rows only when `commit=true`.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use onboard_core::BoardError;
use onboard_core::domain::pipeline::Pipeline;
use onboard_core::ingest::{RejectedRow, TableFormat, read_table};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::api::pipeline::parse_kind;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IngestParams {
    #[serde(default)]
    pub commit: bool,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub accepted: Vec<Pipeline>,
    pub rejected: Vec<RejectedRow>,
    /// Number of records saved; zero for a preview
    pub committed: usize,
}

/// POST /ingest/{kind}?commit=bool
pub async fn ingest_upload(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<IngestParams>,
    body: Bytes,
) -> ApiResult<Json<IngestResponse>> {
    let kind = parse_kind(&kind)?;
    let format = TableFormat::sniff(&body);
    let rows = read_table(&body, kind, format)?;

    let (outcome, committed) = state
        .with_board(move |board| {
            let outcome = board.preview_ingest(kind, rows);
            tracing::info!(
                "Ingest {} ({}): {} accepted, {} rejected (commit: {})",
                kind,
                format,
                outcome.accepted.len(),
                outcome.rejected.len(),
                params.commit
            );

            let committed = if params.commit && !outcome.accepted.is_empty() {
                board.commit(kind, outcome.accepted.clone())?
            } else {
                0
            };
            Ok::<_, BoardError>((outcome, committed))
        })
        .await?;

    Ok(Json(IngestResponse {
        accepted: outcome.accepted,
        rejected: outcome.rejected,
        committed,
    }))
}
