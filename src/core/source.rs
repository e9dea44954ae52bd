//! Decoding of raw CSV text and spreadsheet workbooks into positional rows.
//!
//! No semantic interpretation happens here: a row is just its cells in
//! column order. The first row of every source is a header and is dropped.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use tracing::debug;

use crate::error::SourceError;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text rendering of the cell; integral numbers drop the fractional part.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(value) => format_number(*value),
            Cell::Empty => String::new(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// One data row; index 0 is the leftmost column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceRow {
    pub cells: Vec<Cell>,
}

impl SourceRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Cell at `index`, or `Cell::Empty` when the row is shorter.
    pub fn cell(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&Cell::Empty)
    }

    pub fn text(&self, index: usize) -> String {
        self.cell(index).as_text()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Zero cells or a single empty cell.
    pub fn is_blank(&self) -> bool {
        match self.cells.as_slice() {
            [] => true,
            [only] => only.is_empty(),
            _ => false,
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for SourceRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|s| Cell::from(s.as_ref())).collect())
    }
}

/// Encoding of a raw source, decided before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Decide the format from the file name, falling back to magic bytes.
    pub fn detect(name: Option<&Path>, bytes: &[u8]) -> Self {
        let ext = name
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") | Some("txt") => return SourceFormat::Csv,
            Some("xlsx") | Some("xlsm") | Some("xls") | Some("xlsb") | Some("ods") => {
                return SourceFormat::Workbook;
            }
            _ => {}
        }
        if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
            SourceFormat::Workbook
        } else {
            SourceFormat::Csv
        }
    }
}

/// Parse raw bytes in the given format.
pub fn parse(format: SourceFormat, bytes: &[u8]) -> Result<Vec<SourceRow>, SourceError> {
    match format {
        SourceFormat::Csv => Ok(parse_csv(&String::from_utf8_lossy(bytes))),
        SourceFormat::Workbook => parse_workbook(bytes),
    }
}

/// Split CSV text into rows.
///
/// Lines are split on `,` without any quote awareness: a quoted field that
/// contains a comma is split in two. Each cell is trimmed and loses one
/// wrapping pair of double quotes.
pub fn parse_csv(text: &str) -> Vec<SourceRow> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rows: Vec<SourceRow> = text
        .split('\n')
        .map(|line| line.split(',').map(clean_csv_cell).collect::<SourceRow>())
        .filter(|row| !row.is_blank())
        .skip(1)
        .collect();
    debug!(rows = rows.len(), "parsed csv source");
    rows
}

fn clean_csv_cell(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    trimmed.strip_suffix('"').unwrap_or(trimmed)
}

/// Read the first worksheet of an in-memory workbook.
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<SourceRow>, SourceError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SourceError::NoSheet)??;

    // calamine trims leading empty columns; positions must stay absolute.
    let column_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let rows: Vec<SourceRow> = range
        .rows()
        .map(|cells| {
            let mut row: Vec<Cell> = Vec::with_capacity(column_offset + cells.len());
            row.resize(column_offset, Cell::Empty);
            row.extend(cells.iter().map(workbook_cell));
            while row.last().is_some_and(Cell::is_empty) {
                row.pop();
            }
            SourceRow::new(row)
        })
        .filter(|row| !row.is_blank())
        .skip(1)
        .collect();
    debug!(rows = rows.len(), "parsed workbook source");
    Ok(rows)
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(text) => Cell::from(text.trim()),
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Bool(true) => Cell::Text("TRUE".into()),
        Data::Bool(false) => Cell::Text("FALSE".into()),
        Data::DateTime(value) => Cell::Number(value.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::from(text.as_str()),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_is_dropped_and_quotes_stripped() {
        let text = "id,name\n\"1\" , \" Alice \"\n2,Bob\n";
        let rows = parse_csv(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text(0), "1");
        assert_eq!(rows[0].text(1), " Alice ");
        assert_eq!(rows[1].text(1), "Bob");
    }

    #[test]
    fn blank_lines_are_dropped() {
        let text = "h1,h2\r\na,b\r\n\r\n   \r\n\"\"\r\nc,d\r\n";
        let rows = parse_csv(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text(0), "c");
        assert_eq!(rows[1].text(1), "d");
    }

    #[test]
    fn row_of_commas_is_not_blank() {
        let rows = parse_csv("h\n,,\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 3);
    }

    #[test]
    fn quoted_commas_mis_split() {
        let rows = parse_csv("h\n\"Bangkok, TH\",x\n");
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0].text(0), "Bangkok");
        assert_eq!(rows[0].text(1), "TH");
    }

    #[test]
    fn short_rows_read_as_empty() {
        let rows = parse_csv("h\nonly\n");
        assert_eq!(rows[0].cell(7), &Cell::Empty);
        assert_eq!(rows[0].text(7), "");
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(Cell::Number(12345.0).as_text(), "12345");
        assert_eq!(Cell::Number(1.5).as_text(), "1.5");
    }

    #[test]
    fn format_detection_prefers_extension() {
        assert_eq!(
            SourceFormat::detect(Some(Path::new("staff.XLSX")), b"a,b"),
            SourceFormat::Workbook
        );
        assert_eq!(
            SourceFormat::detect(Some(Path::new("staff.csv")), b"PK\x03\x04"),
            SourceFormat::Csv
        );
        assert_eq!(SourceFormat::detect(None, b"PK\x03\x04rest"), SourceFormat::Workbook);
        assert_eq!(SourceFormat::detect(None, b"id,name"), SourceFormat::Csv);
    }

    #[test]
    fn garbage_workbook_is_an_error() {
        assert!(parse_workbook(b"PK\x03\x04not really a zip").is_err());
    }
}
