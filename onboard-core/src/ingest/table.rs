//! Uploaded tables
//!
//! Reads an upload into raw rows after checking its header row, and writes
//! blank-ish templates users fill in and upload back. Uploads are CSV or
//! xlsx; both go through the same header mapping.

use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fmt;
use std::io::{self, Cursor};
use std::path::Path;

use super::RawRow;
use super::columns::{Column, columns, resolve_header};
use super::error::IngestError;
use super::workbook::read_workbook_rows;
use crate::domain::pipeline::PipelineKind;

/// Zip local file header; every xlsx starts with it
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Upload file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    /// Guess from a file extension, defaulting to CSV
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("xlsx" | "xlsm") => TableFormat::Xlsx,
            _ => TableFormat::Csv,
        }
    }

    /// Guess from the first bytes of an upload
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            TableFormat::Xlsx
        } else {
            TableFormat::Csv
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableFormat::Csv => write!(f, "csv"),
            TableFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// Read an upload held in memory
///
/// # Errors
/// Same as `read_rows` or `read_workbook_rows`, depending on `format`.
pub fn read_table(
    bytes: &[u8],
    kind: PipelineKind,
    format: TableFormat,
) -> Result<Vec<RawRow>, IngestError> {
    match format {
        TableFormat::Csv => read_rows(bytes, kind),
        TableFormat::Xlsx => read_workbook_rows(Cursor::new(bytes), kind),
    }
}

/// Read every data row of a CSV upload
///
/// The header row must name every column of `kind`; extra columns are
/// ignored. Rows whose mapped cells are all blank are skipped.
///
/// # Errors
/// - `EmptyTable` when there is no header row
/// - `MissingColumns` listing every absent column
/// - `Read` when the CSV itself is malformed
pub fn read_rows<R: io::Read>(reader: R, kind: PipelineKind) -> Result<Vec<RawRow>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mapping = map_headers(kind, &headers)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or(index as u64 + 2);

        let cells = record.iter().map(str::to_string);
        if let Some(row) = build_row(line, &mapping, cells) {
            rows.push(row);
        }
    }

    tracing::debug!(%kind, rows = rows.len(), "Read upload");
    Ok(rows)
}

/// Map each header position to a column key, failing on absent columns
///
/// Shared by every table format.
pub(super) fn map_headers(
    kind: PipelineKind,
    headers: &[String],
) -> Result<Vec<Option<&'static str>>, IngestError> {
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(IngestError::EmptyTable);
    }

    let mut mapping = Vec::with_capacity(headers.len());
    let mut seen: Vec<&'static str> = Vec::new();

    for header in headers {
        match resolve_header(kind, header) {
            // first occurrence wins when a column appears twice
            Some(column) if !seen.contains(&column.key) => {
                seen.push(column.key);
                mapping.push(Some(column.key));
            }
            _ => mapping.push(None),
        }
    }

    let missing: Vec<String> = columns(kind)
        .iter()
        .filter(|column| !seen.contains(&column.key))
        .map(|column| column.header.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            kind,
            columns: missing,
        });
    }

    Ok(mapping)
}

/// Assemble a row from positional cells; `None` for a blank row
pub(super) fn build_row(
    line: u64,
    mapping: &[Option<&'static str>],
    cells: impl Iterator<Item = String>,
) -> Option<RawRow> {
    let mut row = RawRow::new(line);
    for (cell, key) in cells.zip(mapping.iter()) {
        if let Some(key) = key {
            row.cells.insert(key.to_string(), cell);
        }
    }

    if row.is_blank() {
        tracing::debug!(line, "Skipping blank row");
        return None;
    }
    Some(row)
}

/// Write a CSV template with the canonical headers and two example rows
pub fn write_template<W: io::Write>(writer: W, kind: PipelineKind) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    let layout = columns(kind);

    writer.write_record(layout.iter().map(|column: &Column| column.header))?;
    for sample in template_samples(kind) {
        writer.write_record(layout.iter().map(|column| {
            sample
                .iter()
                .find(|(key, _)| *key == column.key)
                .map_or("", |(_, value)| *value)
        }))?;
    }

    writer.flush()?;
    Ok(())
}

type SampleRow = &'static [(&'static str, &'static str)];

fn template_samples(kind: PipelineKind) -> &'static [SampleRow] {
    match kind {
        PipelineKind::Batch => &[
            &[
                ("pipeline_name", "Daily Sales Report"),
                ("data_name", "sales_daily.csv"),
                ("frequency", "daily"),
                ("run_day", "Monday"),
                ("run_timestamp", "09:00"),
                ("file_size_mb", "50"),
                ("uat_date", "2024-01-15"),
                ("prod_date", "2024-01-25"),
                ("uat_status", "completed"),
                ("prod_status", "planned"),
                ("comment", "Daily sales aggregation"),
            ],
            &[
                ("pipeline_name", "Weekly Inventory Update"),
                ("data_name", "inventory_weekly.xlsx"),
                ("frequency", "weekly"),
                ("run_day", "Friday"),
                ("run_timestamp", "15:30"),
                ("file_size_mb", "120"),
                ("uat_date", "2024-01-20"),
                ("prod_date", "2024-01-30"),
                ("uat_status", "in progress"),
                ("prod_status", "planned"),
                ("comment", "Weekly inventory snapshot"),
            ],
        ],
        PipelineKind::Streaming => &[
            &[
                ("pipeline_name", "Real-time User Analytics"),
                ("data_name", "user_events.json"),
                ("start_time", "00:00"),
                ("end_time", "23:59"),
                ("run_day", "Daily"),
                ("rough_volume_mb", "2000"),
                ("uat_date", "2024-01-10"),
                ("prod_date", "2024-01-20"),
                ("uat_status", "completed"),
                ("prod_status", "completed"),
                ("comment", "User behavior tracking"),
            ],
            &[
                ("pipeline_name", "Live Sensor Data"),
                ("data_name", "sensor_readings.xml"),
                ("start_time", "08:00"),
                ("end_time", "18:00"),
                ("run_day", "Weekdays"),
                ("rough_volume_mb", "500"),
                ("uat_date", "2024-01-12"),
                ("prod_date", "2024-01-22"),
                ("uat_status", "in progress"),
                ("prod_status", "planned"),
                ("comment", "IoT sensor monitoring"),
            ],
        ],
    }
}
