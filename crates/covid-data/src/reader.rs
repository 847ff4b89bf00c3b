//! CSV record stream for the RKI infection-count file.
//!
//! Turns an open [`BufRead`] into a lazy sequence of [`Record`]s. The stream
//! lets the `csv` reader consume the header row and handle quoting, then
//! extracts the handful of columns the aggregator needs. It never filters or
//! accumulates.

use std::io::BufRead;

use covid_core::error::{CovidError, Result};
use covid_core::models::Record;
use csv::StringRecord;

// ── Column layout ─────────────────────────────────────────────────────────────

pub const REGION_CODE_COLUMN: usize = 0;
pub const AGE_GROUP_COLUMN: usize = 1;
pub const DATE_COLUMN: usize = 3;
pub const CASE_COUNT_COLUMN: usize = 9;
pub const DEATH_COUNT_COLUMN: usize = 10;

/// Rows shorter than this cannot supply every column the aggregator reads.
pub const MIN_COLUMNS: usize = CASE_COUNT_COLUMN + 1;

pub const DEFAULT_DELIMITER: u8 = b',';

// ── RecordStream ──────────────────────────────────────────────────────────────

/// Lazy iterator over the records of one opened source.
///
/// Yields records in source order. Once exhausted (or after an I/O error) it
/// keeps returning `None`; iterate again by re-opening the source.
pub struct RecordStream<R> {
    reader: csv::Reader<R>,
    row: StringRecord,
    finished: bool,
}

impl<R: BufRead> RecordStream<R> {
    /// Wrap `reader`, which must be positioned at the header row.
    pub fn new(reader: R) -> Self {
        Self::with_delimiter(reader, DEFAULT_DELIMITER)
    }

    /// Like [`RecordStream::new`], splitting fields on `delimiter`.
    pub fn with_delimiter(reader: R, delimiter: u8) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);
        Self {
            reader,
            row: StringRecord::new(),
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.reader.read_record(&mut self.row) {
                Ok(false) => self.finished = true,
                Ok(true) => {
                    // Whitespace-only lines come back as a single blank field.
                    if self.row.iter().all(|field| field.trim().is_empty()) {
                        continue;
                    }
                    let line = self.row.position().map_or(0, csv::Position::line);
                    return Some(parse_row(&self.row, line));
                }
                Err(err) => {
                    if err.is_io_error() {
                        self.finished = true;
                    }
                    return Some(Err(csv_error(err)));
                }
            }
        }
        None
    }
}

fn csv_error(err: csv::Error) -> CovidError {
    let line = err.position().map_or(0, csv::Position::line);
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => CovidError::Io(e),
        csv::ErrorKind::Utf8 { err, .. } => CovidError::malformed(
            line,
            format!("field {} is not valid UTF-8", err.field() + 1),
        ),
        _ => CovidError::malformed(line, reason),
    }
}

// ── Row parsing ───────────────────────────────────────────────────────────────

/// Extract a [`Record`] from one parsed row.
///
/// `line_number` is only used for error reporting.
pub fn parse_row(row: &StringRecord, line_number: u64) -> Result<Record> {
    if row.len() < MIN_COLUMNS {
        return Err(CovidError::malformed(
            line_number,
            format!(
                "expected at least {} columns, found {}",
                MIN_COLUMNS,
                row.len()
            ),
        ));
    }
    let field = |i: usize| row.get(i).unwrap_or_default();

    let raw_count = field(CASE_COUNT_COLUMN).trim();
    let case_count = raw_count.parse::<i64>().map_err(|e| {
        CovidError::malformed(line_number, format!("invalid case count {raw_count:?}: {e}"))
    })?;

    let date = field(DATE_COLUMN).trim();
    let has_month = date.split('-').nth(1).is_some_and(|m| !m.is_empty());
    if !has_month {
        return Err(CovidError::malformed(
            line_number,
            format!("date {date:?} has no month component"),
        ));
    }

    // The death count is carried along but never required.
    let death_count = row
        .get(DEATH_COUNT_COLUMN)
        .and_then(|raw| raw.trim().parse::<i64>().ok());

    Ok(Record {
        region_code: field(REGION_CODE_COLUMN).to_string(),
        age_group: field(AGE_GROUP_COLUMN).trim().to_string(),
        date: date.to_string(),
        case_count,
        death_count,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
