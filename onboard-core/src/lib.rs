//! Onboard Core
//!
//! Record model and engine for tracking data pipelines through onboarding.
//!
//! This crate contains:
//! - Domain types: pipelines, contacts, issues and the document holding them
//! - Classification: status text to lifecycle stage
//! - Aggregation: board counts computed from a document
//! - Ingestion: CSV and xlsx upload validation
//! - Store: atomic JSON persistence
//! - Board: validated, persisted mutations over one document

pub mod aggregate;
pub mod board;
pub mod classify;
pub mod domain;
pub mod ingest;
pub mod store;

pub use aggregate::{Report, aggregate, aggregate_with};
pub use board::{Board, BoardError};
pub use classify::{ClassificationRules, Stage, classify, effective_stage};
pub use domain::document::Document;
pub use domain::pipeline::{Pipeline, PipelineKind};
pub use store::{DocumentStore, StoreError};
