//! Report API Handler

use axum::{Json, extract::State};
use onboard_core::Report;

use crate::state::AppState;

/// GET /report
/// Counts recomputed from the current board
pub async fn get_report(State(state): State<AppState>) -> Json<Report> {
    let board = state.board.lock().await;
    Json(board.report(&state.rules))
}
