//! Binary spreadsheet reader backed by calamine.
//!
//! The container format (BIFF `.xls`, zip `.xlsx`/`.xlsm`, `.xlsb`, `.ods`) is
//! detected from the bytes, never from the file name.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use std::io::Cursor;

use super::{Parsed, TableReader};
use crate::error::{ReadError, ReadResult};
use crate::models::{Cell, Dataset, SourceFormat};

/// Reads the first worksheet, treating its first row as the header.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpreadsheetReader;

impl TableReader for SpreadsheetReader {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    fn read(&self, bytes: &[u8]) -> ReadResult<Parsed> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ReadError::Spreadsheet(e.to_string()))?;

        let kind = match &workbook {
            Sheets::Xls(_) => "xls",
            Sheets::Xlsx(_) => "xlsx",
            Sheets::Xlsb(_) => "xlsb",
            Sheets::Ods(_) => "ods",
        };

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ReadError::NoSheets)?
            .map_err(|e| ReadError::Spreadsheet(e.to_string()))?;

        Ok(Parsed {
            dataset: range_to_dataset(&range),
            format: SourceFormat::Spreadsheet { kind },
        })
    }
}

/// Convert a worksheet range into a dataset. An empty range gives an empty dataset.
///
/// The range starts at the first used cell; empty columns to its left are
/// kept so the header lines up with the sheet's own columns.
pub fn range_to_dataset(range: &Range<Data>) -> Dataset {
    let offset = range.start().map_or(0, |(_, col)| col as usize);
    let mut rows = range.rows();

    let header = match rows.next() {
        Some(header) => header,
        None => return Dataset::default(),
    };

    let columns = (0..offset)
        .map(unnamed)
        .chain(
            header
                .iter()
                .enumerate()
                .map(|(i, cell)| header_name(cell, offset + i)),
        )
        .collect();

    let body = rows
        .map(|row| {
            std::iter::repeat(Cell::Empty)
                .take(offset)
                .chain(row.iter().map(to_cell))
                .collect()
        })
        .collect();
    Dataset::new(columns, body)
}

fn unnamed(index: usize) -> String {
    format!("Unnamed: {}", index)
}

fn header_name(cell: &Data, index: usize) -> String {
    match to_cell(cell) {
        Cell::Empty => unnamed(index),
        other => other.to_string(),
    }
}

/// Map a calamine value to a cell.
pub fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) if !dt.is_duration() => Cell::DateTime(naive),
            _ => Cell::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.as_str()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn scores_xlsx() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(0, 1, "Score").unwrap();
        sheet.write_string(1, 0, "Ann").unwrap();
        sheet.write_number(1, 1, 90).unwrap();
        sheet.write_string(2, 0, "Bo").unwrap();
        sheet.write_number(2, 1, 85.5).unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_reads_first_sheet_with_header() {
        let parsed = SpreadsheetReader.read(&scores_xlsx()).unwrap();

        assert_eq!(parsed.format, SourceFormat::Spreadsheet { kind: "xlsx" });
        assert_eq!(parsed.dataset.columns(), &["Name", "Score"]);
        assert_eq!(parsed.dataset.row_count(), 2);
        assert_eq!(parsed.dataset.rows()[0][0], Cell::Text("Ann".into()));
        assert_eq!(parsed.dataset.rows()[0][1].to_string(), "90");
        assert_eq!(parsed.dataset.rows()[1][1].to_string(), "85.5");
    }

    #[test]
    fn test_only_first_sheet_used() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "first").unwrap();
        workbook.add_worksheet().write_string(0, 0, "second").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = SpreadsheetReader.read(&bytes).unwrap();
        assert_eq!(parsed.dataset.columns(), &["first"]);
    }

    #[test]
    fn test_empty_header_cells_named() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "id").unwrap();
        sheet.write_string(0, 2, "note").unwrap();
        sheet.write_number(1, 1, 7).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = SpreadsheetReader.read(&bytes).unwrap();
        assert_eq!(parsed.dataset.columns(), &["id", "Unnamed: 1", "note"]);
        assert_eq!(
            parsed.dataset.rows()[0],
            vec![Cell::Empty, Cell::Float(7.0), Cell::Empty]
        );
    }

    #[test]
    fn test_leading_empty_columns_kept() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 1, "Name").unwrap();
        sheet.write_string(0, 2, "Score").unwrap();
        sheet.write_string(1, 1, "Ann").unwrap();
        sheet.write_number(1, 2, 90).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = SpreadsheetReader.read(&bytes).unwrap();
        assert_eq!(parsed.dataset.columns(), &["Unnamed: 0", "Name", "Score"]);
        assert_eq!(
            parsed.dataset.rows()[0],
            vec![Cell::Empty, Cell::Text("Ann".into()), Cell::Float(90.0)]
        );
    }

    #[test]
    fn test_unnamed_header_index_is_absolute() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 2, "id").unwrap();
        sheet.write_number(1, 3, 5).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = SpreadsheetReader.read(&bytes).unwrap();
        assert_eq!(
            parsed.dataset.columns(),
            &["Unnamed: 0", "Unnamed: 1", "id", "Unnamed: 3"]
        );
    }

    #[test]
    fn test_html_bytes_rejected() {
        let err = SpreadsheetReader
            .read(b"<html><table><tr><td>x</td></tr></table></html>")
            .unwrap_err();
        assert!(matches!(err, ReadError::Spreadsheet(_)));
    }

    #[test]
    fn test_empty_range() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_dataset(&range).is_empty());
    }
}
