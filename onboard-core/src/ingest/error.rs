//! Ingestion error types

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::domain::pipeline::PipelineKind;

/// Where a conflicting pipeline name was already seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DuplicateSource {
    /// An earlier accepted row of the same upload
    Upload { line: u64 },
    /// The persisted collection for this kind
    Stored,
}

impl fmt::Display for DuplicateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateSource::Upload { line } => write!(f, "already used on line {}", line),
            DuplicateSource::Stored => write!(f, "already on the board"),
        }
    }
}

/// Per-row problem; rejects the row but never the upload
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid {field} '{value}': expected {expected}")]
    InvalidFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("duplicate pipeline name '{name}' ({conflict})")]
    DuplicateName {
        name: String,
        conflict: DuplicateSource,
    },
}

/// Whole-file problem found before any row is looked at
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("upload has no header row")]
    EmptyTable,

    #[error("{kind} upload is missing required column(s): {}", .columns.join(", "))]
    MissingColumns {
        kind: PipelineKind,
        columns: Vec<String>,
    },

    #[error("failed to read upload: {0}")]
    Read(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let missing = IngestError::MissingColumns {
            kind: PipelineKind::Streaming,
            columns: vec!["Start Time".to_string(), "End Time".to_string()],
        };
        assert_eq!(
            missing.to_string(),
            "streaming upload is missing required column(s): Start Time, End Time"
        );

        let duplicate = RowError::DuplicateName {
            name: "Daily Sales".to_string(),
            conflict: DuplicateSource::Upload { line: 2 },
        };
        assert_eq!(
            duplicate.to_string(),
            "duplicate pipeline name 'Daily Sales' (already used on line 2)"
        );
    }

    #[test]
    fn test_row_error_serializes_with_type_tag() {
        let value = serde_json::to_value(RowError::MissingField { field: "data_name" }).unwrap();
        assert_eq!(value["type"], "missing_field");
        assert_eq!(value["field"], "data_name");
    }
}
