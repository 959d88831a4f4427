//! Spreadsheet column layout
//!
//! Every upload column maps to one record field. Headers are matched after
//! normalization, so `File Size (MB)`, `file_size_mb` and the older
//! `file_size` all land on the same field.

use crate::domain::pipeline::PipelineKind;

/// One spreadsheet column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Record field name, also the normalized header
    pub key: &'static str,
    /// Header written to templates
    pub header: &'static str,
    /// Other normalized headers accepted for this column
    pub aliases: &'static [&'static str],
    /// Whether a row must have a non-blank value here
    pub required: bool,
}

const fn column(key: &'static str, header: &'static str, required: bool) -> Column {
    Column {
        key,
        header,
        aliases: &[],
        required,
    }
}

pub const PIPELINE_NAME: &str = "pipeline_name";
pub const DATA_NAME: &str = "data_name";
pub const RUN_DAY: &str = "run_day";
pub const UAT_DATE: &str = "uat_date";
pub const PROD_DATE: &str = "prod_date";
pub const UAT_STATUS: &str = "uat_status";
pub const PROD_STATUS: &str = "prod_status";
pub const COMMENT: &str = "comment";
pub const FREQUENCY: &str = "frequency";
pub const RUN_TIMESTAMP: &str = "run_timestamp";
pub const FILE_SIZE_MB: &str = "file_size_mb";
pub const START_TIME: &str = "start_time";
pub const END_TIME: &str = "end_time";
pub const ROUGH_VOLUME_MB: &str = "rough_volume_mb";

pub const BATCH_COLUMNS: &[Column] = &[
    column(PIPELINE_NAME, "Pipeline Name", true),
    column(DATA_NAME, "Data Name", true),
    column(FREQUENCY, "Frequency", true),
    column(RUN_DAY, "Run Day", true),
    column(RUN_TIMESTAMP, "Run Timestamp", true),
    Column {
        key: FILE_SIZE_MB,
        header: "File Size (MB)",
        aliases: &["file_size"],
        required: true,
    },
    column(UAT_DATE, "UAT Date", false),
    column(PROD_DATE, "PROD Date", false),
    column(UAT_STATUS, "UAT Status", false),
    column(PROD_STATUS, "PROD Status", false),
    column(COMMENT, "Comment", false),
];

pub const STREAMING_COLUMNS: &[Column] = &[
    column(PIPELINE_NAME, "Pipeline Name", true),
    column(DATA_NAME, "Data Name", true),
    column(START_TIME, "Start Time", true),
    column(END_TIME, "End Time", true),
    column(RUN_DAY, "Run Day", true),
    Column {
        key: ROUGH_VOLUME_MB,
        header: "Rough Volume (MB)",
        aliases: &["rough_volume"],
        required: true,
    },
    column(UAT_DATE, "UAT Date", false),
    column(PROD_DATE, "PROD Date", false),
    column(UAT_STATUS, "UAT Status", false),
    column(PROD_STATUS, "PROD Status", false),
    column(COMMENT, "Comment", false),
];

/// Columns an upload of this kind must carry, in template order
pub fn columns(kind: PipelineKind) -> &'static [Column] {
    match kind {
        PipelineKind::Batch => BATCH_COLUMNS,
        PipelineKind::Streaming => STREAMING_COLUMNS,
    }
}

/// Lowercase a header and collapse every run of non-alphanumerics to `_`
pub fn normalize_header(header: &str) -> String {
    let mut normalized = String::with_capacity(header.len());
    let mut pending_separator = false;

    for ch in header.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('_');
            }
            pending_separator = false;
            normalized.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    normalized
}

/// Find the column a raw header refers to
pub fn resolve_header(kind: PipelineKind, header: &str) -> Option<&'static Column> {
    let normalized = normalize_header(header);
    columns(kind)
        .iter()
        .find(|column| column.key == normalized || column.aliases.contains(&normalized.as_str()))
}
