//! Contact API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use onboard_core::domain::contact::Contact;

use crate::api::error::ApiResult;
use crate::state::AppState;

/// GET /contact
pub async fn list_contacts(State(state): State<AppState>) -> ApiResult<Json<Vec<Contact>>> {
    let board = state.board.lock().await;
    Ok(Json(board.document().contacts.clone()))
}

/// POST /contact
pub async fn create_contact(
    State(state): State<AppState>,
    Json(contact): Json<Contact>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    tracing::info!("Creating contact: {}", contact.name);

    let stored = contact.clone();
    state.with_board(move |board| board.add_contact(stored)).await?;

    Ok((StatusCode::CREATED, Json(contact)))
}

/// DELETE /contact/{name}
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting contact: {}", name);

    state
        .with_board(move |board| board.remove_contact(&name))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
