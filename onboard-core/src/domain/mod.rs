//! Core domain types
//!
//! This module contains the record model tracked by the onboarding board:
//! batch and streaming pipelines, the contacts that own them, the issues
//! raised against them, and the document that persists all of it as one unit.

pub mod contact;
pub mod document;
pub mod issue;
pub mod pipeline;
pub mod time_of_day;

use thiserror::Error;

use pipeline::PipelineKind;

/// Identity key used when comparing record names.
///
/// Names are compared trimmed and case-insensitively, so `"Daily Sales "` and
/// `"daily sales"` refer to the same record.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Field-level invariant violations of the record model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("pipeline name cannot be empty")]
    EmptyName,

    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidQuantity { field: &'static str, value: f64 },

    #[error("duplicate {kind} pipeline name '{name}'")]
    DuplicateName { kind: PipelineKind, name: String },

    #[error("{found} pipeline '{name}' cannot be stored as a {expected} pipeline")]
    KindMismatch {
        name: String,
        expected: PipelineKind,
        found: PipelineKind,
    },

    #[error("contact name cannot be empty")]
    EmptyContactName,

    #[error("issue title cannot be empty")]
    EmptyIssueTitle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_ignores_case_and_padding() {
        assert_eq!(name_key("  Daily Sales "), "daily sales");
        assert_eq!(name_key("DAILY SALES"), name_key("daily sales"));
    }
}
