//! Shared helpers for the CSV loaders on `Well`, `Reading` and `Allocation`.
//!
//! Loaders never abort on a bad row: the row is logged, recorded in
//! [`CsvBatch::rejected`] and skipped. Only unreadable CSV is an error.

use crate::error::ParseError;
use csv::{ReaderBuilder, StringRecord};
use std::fmt::Display;
use std::str::FromStr;

/// Rows parsed from one CSV document.
#[derive(Debug, Default)]
pub struct CsvBatch<T> {
    pub records: Vec<T>,
    pub rejected: Vec<ParseError>,
}

/// Parse every data row of a CSV document with headers.
///
/// `parse_row` receives the record and its 1-based line number in the file
/// (the header is line 1).
pub(crate) fn parse_csv<T, F>(csv_data: &str, kind: &str, mut parse_row: F) -> Result<CsvBatch<T>, ParseError>
where
    F: FnMut(&StringRecord, usize) -> Result<T, ParseError>,
{
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let mut batch = CsvBatch {
        records: Vec::new(),
        rejected: Vec::new(),
    };
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = index + 2;
        match parse_row(&record, row) {
            Ok(parsed) => batch.records.push(parsed),
            Err(e) => {
                log::warn!("skipping {} {}", kind, e);
                batch.rejected.push(e);
            }
        }
    }
    log::info!(
        "loaded {} {} rows, skipped {}",
        batch.records.len(),
        kind,
        batch.rejected.len()
    );
    Ok(batch)
}

/// A trimmed, non-empty cell.
pub(crate) fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn required<'r>(
    record: &'r StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<&'r str, ParseError> {
    cell(record, idx).ok_or_else(|| ParseError::field(row, format!("missing {}", name)))
}

pub(crate) fn optional<T>(
    record: &StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<Option<T>, ParseError>
where
    T: FromStr,
    T::Err: Display,
{
    cell(record, idx)
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| ParseError::field(row, format!("bad {} '{}': {}", name, s, e)))
        })
        .transpose()
}

pub(crate) fn parsed<T>(record: &StringRecord, idx: usize, name: &str, row: usize) -> Result<T, ParseError>
where
    T: FromStr,
    T::Err: Display,
{
    optional(record, idx, name, row)?.ok_or_else(|| ParseError::field(row, format!("missing {}", name)))
}

/// Parse a date cell with the shared "YYYY-MM-DD" format.
pub(crate) fn optional_date(
    record: &StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<Option<chrono::NaiveDate>, ParseError> {
    cell(record, idx)
        .map(|s| {
            sgma_utils::dates::parse_date(s)
                .map_err(|e| ParseError::field(row, format!("bad {} '{}': {}", name, s, e)))
        })
        .transpose()
}
