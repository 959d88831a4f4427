//! Spreadsheet ingestion
//!
//! Turns uploaded rows into validated pipeline records. Each row is checked on
//! its own: a bad row is rejected with every problem found on it, and the rest
//! of the upload carries on. Nothing here touches the store; the caller decides
//! whether to commit the accepted rows.

pub mod columns;
pub mod error;
pub mod table;
pub mod workbook;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::name_key;
use crate::domain::pipeline::{
    BatchDetails, Frequency, Pipeline, PipelineBase, PipelineDetails, PipelineKind,
    StreamingDetails,
};
use crate::domain::time_of_day;
use columns::*;
pub use error::{DuplicateSource, IngestError, RowError};
pub use table::{TableFormat, read_rows, read_table, write_template};
pub use workbook::read_workbook_rows;

/// One uploaded row, cells keyed by column key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// Line number in the source file
    pub line: u64,
    pub cells: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(line: u64) -> Self {
        Self {
            line,
            cells: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.cells.insert(key.to_string(), value.to_string());
        self
    }

    /// Trimmed cell value, `None` when absent or blank
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|value| value.trim().is_empty())
    }
}

/// A row that did not become a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub row: RawRow,
    pub errors: Vec<RowError>,
}

/// Result of validating one upload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestOutcome {
    /// Validated records, in upload order, not yet persisted
    pub accepted: Vec<Pipeline>,
    pub rejected: Vec<RejectedRow>,
}

/// Validate uploaded rows against a kind's contract
///
/// `existing` is the persisted collection for `kind`; names already there, or
/// already accepted earlier in this upload, are rejected as duplicates.
pub fn ingest(rows: Vec<RawRow>, kind: PipelineKind, existing: &[Pipeline]) -> IngestOutcome {
    let stored: HashSet<String> = existing.iter().map(Pipeline::name_key).collect();
    let mut accepted_lines: HashMap<String, u64> = HashMap::new();
    let mut outcome = IngestOutcome::default();

    for row in rows {
        let (pipeline, mut errors) = match parse_row(&row, kind) {
            Ok(pipeline) => (Some(pipeline), Vec::new()),
            Err(errors) => (None, errors),
        };

        if let Some(name) = row.get(PIPELINE_NAME) {
            let key = name_key(name);
            let conflict = if stored.contains(&key) {
                Some(DuplicateSource::Stored)
            } else {
                accepted_lines
                    .get(&key)
                    .map(|&line| DuplicateSource::Upload { line })
            };
            if let Some(conflict) = conflict {
                errors.push(RowError::DuplicateName {
                    name: name.to_string(),
                    conflict,
                });
            }
        }

        match pipeline {
            Some(pipeline) if errors.is_empty() => {
                tracing::debug!(line = row.line, name = pipeline.name(), "Accepted row");
                accepted_lines.insert(pipeline.name_key(), row.line);
                outcome.accepted.push(pipeline);
            }
            _ => {
                tracing::warn!(line = row.line, errors = errors.len(), "Rejected row");
                outcome.rejected.push(RejectedRow { row, errors });
            }
        }
    }

    tracing::info!(
        %kind,
        accepted = outcome.accepted.len(),
        rejected = outcome.rejected.len(),
        "Validated upload"
    );
    outcome
}

/// Coerce one row into a record, collecting every field error
pub fn parse_row(row: &RawRow, kind: PipelineKind) -> Result<Pipeline, Vec<RowError>> {
    let mut fields = RowFields {
        row,
        errors: Vec::new(),
    };

    let pipeline_name = fields.required(PIPELINE_NAME);
    let data_name = fields.required(DATA_NAME);
    let run_day = fields.required(RUN_DAY);
    let uat_date = fields.optional(UAT_DATE, DATE_EXPECTED, parse_date);
    let prod_date = fields.optional(PROD_DATE, DATE_EXPECTED, parse_date);

    let details = match kind {
        PipelineKind::Batch => {
            let frequency = fields.required_parsed(
                FREQUENCY,
                "one of daily, weekly, monthly, other",
                |s| s.parse::<Frequency>().ok(),
            );
            let run_timestamp = fields.required_parsed(RUN_TIMESTAMP, TIME_EXPECTED, time_of_day::parse);
            let file_size_mb = fields.required_parsed(FILE_SIZE_MB, QUANTITY_EXPECTED, parse_quantity);

            match (frequency, run_timestamp, file_size_mb) {
                (Some(frequency), Some(run_timestamp), Some(file_size_mb)) => {
                    Some(PipelineDetails::Batch(BatchDetails {
                        frequency,
                        run_timestamp,
                        file_size_mb,
                    }))
                }
                _ => None,
            }
        }
        PipelineKind::Streaming => {
            let start_time = fields.required_parsed(START_TIME, TIME_EXPECTED, time_of_day::parse);
            let end_time = fields.required_parsed(END_TIME, TIME_EXPECTED, time_of_day::parse);
            let rough_volume_mb =
                fields.required_parsed(ROUGH_VOLUME_MB, QUANTITY_EXPECTED, parse_quantity);

            match (start_time, end_time, rough_volume_mb) {
                (Some(start_time), Some(end_time), Some(rough_volume_mb)) => {
                    Some(PipelineDetails::Streaming(StreamingDetails {
                        start_time,
                        end_time,
                        rough_volume_mb,
                    }))
                }
                _ => None,
            }
        }
    };

    let base = match (pipeline_name, data_name, run_day, uat_date, prod_date) {
        (Some(pipeline_name), Some(data_name), Some(run_day), Some(uat_date), Some(prod_date)) => {
            PipelineBase {
                pipeline_name,
                data_name,
                run_day,
                uat_date,
                prod_date,
                uat_status: fields.text(UAT_STATUS),
                prod_status: fields.text(PROD_STATUS),
                comment: row.get(COMMENT).map(str::to_string),
            }
        }
        _ => return Err(fields.errors),
    };

    match details {
        Some(details) if fields.errors.is_empty() => Ok(Pipeline { base, details }),
        _ => Err(fields.errors),
    }
}

const DATE_EXPECTED: &str = "a date (YYYY-MM-DD)";
const TIME_EXPECTED: &str = "a time of day (HH:MM)";
const QUANTITY_EXPECTED: &str = "a non-negative number";

/// Field reader that records errors instead of stopping at the first one
struct RowFields<'a> {
    row: &'a RawRow,
    errors: Vec<RowError>,
}

impl RowFields<'_> {
    fn required(&mut self, field: &'static str) -> Option<String> {
        match self.row.get(field) {
            Some(value) => Some(value.to_string()),
            None => {
                self.errors.push(RowError::MissingField { field });
                None
            }
        }
    }

    fn required_parsed<T>(
        &mut self,
        field: &'static str,
        expected: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let row = self.row;
        let value = row.get(field);
        if value.is_none() {
            self.errors.push(RowError::MissingField { field });
        }
        value.and_then(|value| self.coerce(field, value, expected, parse))
    }

    /// Outer `None` signals a format error, inner `None` an empty cell
    fn optional<T>(
        &mut self,
        field: &'static str,
        expected: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<Option<T>> {
        let row = self.row;
        match row.get(field) {
            None => Some(None),
            Some(value) => self.coerce(field, value, expected, parse).map(Some),
        }
    }

    fn coerce<T>(
        &mut self,
        field: &'static str,
        value: &str,
        expected: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let parsed = parse(value);
        if parsed.is_none() {
            self.errors.push(RowError::InvalidFormat {
                field,
                value: value.to_string(),
                expected,
            });
        }
        parsed
    }

    fn text(&self, field: &str) -> String {
        self.row.get(field).unwrap_or_default().to_string()
    }
}

/// Parse an upload date, keeping only the date part of datetimes
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Parse a size or volume in megabytes
pub fn parse_quantity(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}
