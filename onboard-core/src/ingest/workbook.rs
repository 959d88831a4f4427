//! Excel workbooks
//!
//! Reads the first worksheet of an `.xlsx` upload into the same raw rows the
//! CSV reader produces. Date and time cells are rendered as ISO text, so row
//! coercion does not care which format the upload came in.

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use std::io::{Read, Seek};

use super::RawRow;
use super::columns::*;
use super::error::IngestError;
use super::table::{build_row, map_headers};
use crate::domain::pipeline::PipelineKind;
use crate::domain::time_of_day;

/// Read every data row of the first worksheet
///
/// Header checks and blank-row handling match `read_rows`. Line numbers are
/// the 1-based spreadsheet row numbers.
///
/// # Errors
/// - `EmptyTable` when the workbook has no worksheet or no header row
/// - `MissingColumns` listing every absent column
/// - `Workbook` when the file is not a readable xlsx workbook
pub fn read_workbook_rows<R: Read + Seek>(
    reader: R,
    kind: PipelineKind,
) -> Result<Vec<RawRow>, IngestError> {
    let mut workbook: Xlsx<R> = Xlsx::new(reader)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptyTable)??;

    let first_row = range.start().map_or(0, |(row, _)| u64::from(row));
    let mut sheet_rows = range.rows();

    let Some(header_cells) = sheet_rows.next() else {
        return Err(IngestError::EmptyTable);
    };
    let headers: Vec<String> = header_cells
        .iter()
        .map(|cell| render_cell(None, cell))
        .collect();
    let mapping = map_headers(kind, &headers)?;

    let mut rows = Vec::new();
    for (index, cells) in sheet_rows.enumerate() {
        // header is spreadsheet row first_row + 1
        let line = first_row + index as u64 + 2;
        let rendered = cells
            .iter()
            .zip(mapping.iter())
            .map(|(cell, key)| render_cell(*key, cell));
        if let Some(row) = build_row(line, &mapping, rendered) {
            rows.push(row);
        }
    }

    tracing::debug!(%kind, rows = rows.len(), "Read workbook upload");
    Ok(rows)
}

/// Cell text as the row parser expects it for column `key`
fn render_cell(key: Option<&str>, cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) if is_time_column(key) && (0.0..1.0).contains(value) => {
            time_of_day::format(&day_fraction_to_time(*value))
        }
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => render_datetime(key, datetime),
            None => value.as_f64().to_string(),
        },
        other => other.to_string(),
    }
}

fn render_datetime(key: Option<&str>, datetime: NaiveDateTime) -> String {
    match key {
        Some(UAT_DATE | PROD_DATE) => datetime.date().format("%Y-%m-%d").to_string(),
        _ if is_time_column(key) => time_of_day::format(&round_to_second(datetime.time())),
        _ => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

fn is_time_column(key: Option<&str>) -> bool {
    matches!(key, Some(RUN_TIMESTAMP | START_TIME | END_TIME))
}

/// Excel stores a bare time as a fraction of a day
fn day_fraction_to_time(fraction: f64) -> NaiveTime {
    let seconds = (fraction * 86_400.0).round() as u32 % 86_400;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or(NaiveTime::MIN)
}

/// Serial times come back a few microseconds off; snap to the nearest second
fn round_to_second(time: NaiveTime) -> NaiveTime {
    let truncated = time.with_nanosecond(0).unwrap_or(time);
    if time.nanosecond() >= 500_000_000 {
        truncated + TimeDelta::seconds(1)
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
    use std::io::Cursor;

    const STREAMING_HEADERS: [&str; 11] = [
        "Pipeline Name",
        "Data Name",
        "Start Time",
        "End Time",
        "Run Day",
        "Rough Volume (MB)",
        "UAT Date",
        "PROD Date",
        "UAT Status",
        "PROD Status",
        "Comment",
    ];

    fn streaming_workbook() -> Vec<u8> {
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let time_format = Format::new().set_num_format("hh:mm");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, header) in STREAMING_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }

        sheet.write_string(1, 0, "Live Sensor Data").unwrap();
        sheet.write_string(1, 1, "sensor_readings.xml").unwrap();
        sheet
            .write_datetime_with_format(1, 2, &ExcelDateTime::from_hms(8, 0, 0).unwrap(), &time_format)
            .unwrap();
        sheet
            .write_datetime_with_format(1, 3, &ExcelDateTime::from_hms(15, 30, 0).unwrap(), &time_format)
            .unwrap();
        sheet.write_string(1, 4, "Weekdays").unwrap();
        sheet.write_number(1, 5, 500).unwrap();
        sheet
            .write_datetime_with_format(1, 6, &ExcelDateTime::from_ymd(2024, 1, 12).unwrap(), &date_format)
            .unwrap();
        sheet.write_string(1, 8, "in progress").unwrap();
        sheet.write_string(1, 9, "planned").unwrap();

        // row 3 left empty on purpose, row 4 has a bad volume
        sheet.write_string(3, 0, "Broken Feed").unwrap();
        sheet.write_string(3, 1, "events.json").unwrap();
        sheet.write_string(3, 2, "00:00").unwrap();
        sheet.write_string(3, 3, "23:59").unwrap();
        sheet.write_string(3, 4, "Daily").unwrap();
        sheet.write_string(3, 5, "lots").unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_native_date_and_time_cells_become_iso_text() {
        let bytes = streaming_workbook();

        let rows = read_workbook_rows(Cursor::new(bytes), PipelineKind::Streaming).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].get(PIPELINE_NAME), Some("Live Sensor Data"));
        assert_eq!(rows[0].get(START_TIME), Some("08:00"));
        assert_eq!(rows[0].get(END_TIME), Some("15:30"));
        assert_eq!(rows[0].get(ROUGH_VOLUME_MB), Some("500"));
        assert_eq!(rows[0].get(UAT_DATE), Some("2024-01-12"));
        assert_eq!(rows[0].get(PROD_DATE), None);
        assert_eq!(rows[1].line, 4);
    }

    #[test]
    fn test_workbook_rows_go_through_the_same_validation() {
        let rows = read_workbook_rows(Cursor::new(streaming_workbook()), PipelineKind::Streaming)
            .unwrap();

        let outcome = crate::ingest::ingest(rows, PipelineKind::Streaming, &[]);

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].row.line, 4);
    }

    #[test]
    fn test_workbook_missing_columns() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Pipeline Name").unwrap();
        sheet.write_string(1, 0, "Daily Sales").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        match read_workbook_rows(Cursor::new(bytes), PipelineKind::Batch) {
            Err(IngestError::MissingColumns { columns, .. }) => {
                assert!(columns.contains(&"Run Timestamp".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_not_a_workbook() {
        let result = read_workbook_rows(Cursor::new(b"Pipeline Name\n".to_vec()), PipelineKind::Batch);
        assert!(matches!(result, Err(IngestError::Workbook(_))));
    }

    #[test]
    fn test_day_fraction_to_time() {
        assert_eq!(
            day_fraction_to_time(0.375),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(
            round_to_second(NaiveTime::from_hms_milli_opt(15, 29, 59, 999).unwrap()),
            NaiveTime::from_hms_opt(15, 30, 0).unwrap()
        );
    }
}
