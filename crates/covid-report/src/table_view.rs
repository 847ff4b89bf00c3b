//! Column-aligned text table of a [`CountMatrix`].
//!
//! One column per age group, one row per bucket key. Bucket keys and
//! age-group labels are sorted lexicographically, so the `SUM` row follows
//! the year and month rows.

use std::io::{self, Write};

use covid_core::matrix::{AgeGroupHeader, CountMatrix};
use unicode_width::UnicodeWidthStr;

/// Caption of the first header cell.
pub const FIRST_COLUMN_TITLE: &str = "AgeGroup";

const COLUMN_GAP: &str = "  ";

/// Data for a single row in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowData {
    /// Bucket key, e.g. `"2021"`, `"2021-03"` or `"SUM"`.
    pub bucket: String,
    /// One count per sorted age group; absent cells are zero.
    pub counts: Vec<i64>,
}

/// Sorted, render-ready view of an aggregation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<TableRowData>,
}

impl TableData {
    pub fn new(matrix: &CountMatrix, header: &AgeGroupHeader) -> Self {
        let columns: Vec<String> = header.sorted().into_iter().map(String::from).collect();
        let rows = matrix
            .sorted_bucket_keys()
            .into_iter()
            .map(|bucket| TableRowData {
                bucket: bucket.to_string(),
                counts: columns.iter().map(|age| matrix.get(bucket, age)).collect(),
            })
            .collect();
        Self { columns, rows }
    }
}

/// Renders [`TableData`] as plain text.
#[derive(Debug, Clone, Default)]
pub struct TableRenderer;

impl TableRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render the whole table into a `String`.
    pub fn render(&self, matrix: &CountMatrix, header: &AgeGroupHeader) -> String {
        let mut out = Vec::new();
        // Writing into a Vec<u8> cannot fail.
        let _ = self.write(&mut out, matrix, header);
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Write the table to `out`, one line per row.
    pub fn write<W: Write + ?Sized>(
        &self,
        out: &mut W,
        matrix: &CountMatrix,
        header: &AgeGroupHeader,
    ) -> io::Result<()> {
        let data = TableData::new(matrix, header);
        let cells: Vec<Vec<String>> = data
            .rows
            .iter()
            .map(|row| row.counts.iter().map(i64::to_string).collect())
            .collect();

        let first_width = data
            .rows
            .iter()
            .map(|row| row.bucket.width())
            .chain(std::iter::once(FIRST_COLUMN_TITLE.width()))
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = data
            .columns
            .iter()
            .enumerate()
            .map(|(i, title)| {
                cells
                    .iter()
                    .map(|row| row[i].width())
                    .chain(std::iter::once(title.width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut line = pad_right(FIRST_COLUMN_TITLE, first_width);
        for (title, width) in data.columns.iter().zip(&widths) {
            line.push_str(COLUMN_GAP);
            line.push_str(&pad_left(title, *width));
        }
        writeln!(out, "{}", line.trim_end())?;

        let total_width = first_width + widths.iter().map(|w| w + COLUMN_GAP.len()).sum::<usize>();
        writeln!(out, "{}", "-".repeat(total_width))?;

        for (row, counts) in data.rows.iter().zip(&cells) {
            let mut line = pad_right(&row.bucket, first_width);
            for (count, width) in counts.iter().zip(&widths) {
                line.push_str(COLUMN_GAP);
                line.push_str(&pad_left(count, *width));
            }
            writeln!(out, "{}", line.trim_end())?;
        }

        Ok(())
    }
}

fn pad_right(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn pad_left(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", " ".repeat(fill), text)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
