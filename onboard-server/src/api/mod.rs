//! API Module
//!
//! HTTP API layer over the onboarding board.
//! Each submodule handles endpoints for a specific record type.

pub mod contact;
pub mod error;
pub mod health;
pub mod ingest;
pub mod issue;
pub mod pipeline;
pub mod report;
pub mod snapshot;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/report", get(report::get_report))
        // Pipeline endpoints
        .route("/pipeline/{kind}/list", get(pipeline::list_pipelines))
        .route("/pipeline/{kind}/create", post(pipeline::create_pipeline))
        .route(
            "/pipeline/{kind}/{name}",
            get(pipeline::get_pipeline)
                .put(pipeline::replace_pipeline)
                .delete(pipeline::delete_pipeline),
        )
        .route("/ingest/{kind}", post(ingest::ingest_upload))
        // Issue endpoints
        .route("/issue", get(issue::list_issues).post(issue::create_issue))
        .route("/issue/{id}/status", post(issue::update_issue_status))
        .route("/issue/{id}", delete(issue::delete_issue))
        // Contact endpoints
        .route(
            "/contact",
            get(contact::list_contacts).post(contact::create_contact),
        )
        .route("/contact/{name}", delete(contact::delete_contact))
        // Snapshots
        .route("/export", get(snapshot::export_snapshot))
        .route("/restore", post(snapshot::restore_snapshot))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
