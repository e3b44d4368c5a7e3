//! HTML table reader for reports saved as `.xls` by legacy exporters.

use scraper::{ElementRef, Html};

use super::decode::DecoderChain;
use super::{Parsed, TableReader};
use crate::error::{ReadError, ReadResult};
use crate::models::{Cell, Dataset, SourceFormat};

/// Upper bound for `colspan`/`rowspan` attributes.
const MAX_SPAN: usize = 1000;

/// Decodes the bytes with a [`DecoderChain`] and reads the first `<table>`.
#[derive(Debug, Clone, Default)]
pub struct HtmlTableReader {
    decoders: DecoderChain,
}

impl HtmlTableReader {
    pub fn new(decoders: DecoderChain) -> Self {
        Self { decoders }
    }
}

impl TableReader for HtmlTableReader {
    fn name(&self) -> &'static str {
        "html-table"
    }

    fn read(&self, bytes: &[u8]) -> ReadResult<Parsed> {
        let decoded = self.decoders.decode(bytes);
        let dataset = first_table(&decoded.text)?;
        Ok(Parsed {
            dataset,
            format: SourceFormat::HtmlTable {
                encoding: decoded.encoding,
                lossy: decoded.lossy,
            },
        })
    }
}

/// Parse `html` and build a dataset from its first `<table>` that holds text.
///
/// Tables are visited in document order; empty layout or spacer tables are
/// skipped.
pub fn first_table(html: &str) -> ReadResult<Dataset> {
    let document = Html::parse_document(html);

    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "table")
        .map(|table| expand_spans(&table_rows(table)))
        .find(|grid| grid.iter().flatten().any(|text| !text.is_empty()))
        .map(grid_to_dataset)
        .ok_or(ReadError::NoTableFound)
}

/// First grid row is the header; the rest are data rows.
fn grid_to_dataset(mut grid: Vec<Vec<String>>) -> Dataset {
    let header = grid.remove(0);
    let width = grid
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);

    let columns = (0..width)
        .map(|i| match header.get(i) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Unnamed: {}", i),
        })
        .collect();

    let rows = grid
        .into_iter()
        .map(|row| row.into_iter().map(Cell::text).collect())
        .collect();

    Dataset::new(columns, rows)
}

/// The table's own `<tr>` elements, skipping rows of nested tables.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

struct SpanCell {
    column: usize,
    rows_left: usize,
    text: String,
}

/// Lay out cells on a grid, repeating values across `colspan` and `rowspan`.
fn expand_spans(rows: &[ElementRef<'_>]) -> Vec<Vec<String>> {
    let mut grid = Vec::with_capacity(rows.len());
    let mut pending: Vec<SpanCell> = Vec::new();

    for tr in rows {
        let mut slots: Vec<Option<String>> = Vec::new();

        for span in pending.iter_mut() {
            place(&mut slots, span.column, span.text.clone());
            span.rows_left -= 1;
        }
        pending.retain(|span| span.rows_left > 0);

        let mut column = 0;
        for cell in tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| matches!(el.value().name(), "td" | "th"))
        {
            let text = cell_text(cell);
            let colspan = span_attr(cell, "colspan");
            let rowspan = span_attr(cell, "rowspan");

            for _ in 0..colspan {
                while matches!(slots.get(column), Some(Some(_))) {
                    column += 1;
                }
                place(&mut slots, column, text.clone());
                if rowspan > 1 {
                    pending.push(SpanCell {
                        column,
                        rows_left: rowspan - 1,
                        text: text.clone(),
                    });
                }
                column += 1;
            }
        }

        grid.push(slots.into_iter().map(Option::unwrap_or_default).collect());
    }

    grid
}

fn place(slots: &mut Vec<Option<String>>, column: usize, text: String) {
    if slots.len() <= column {
        slots.resize(column + 1, None);
    }
    slots[column] = Some(text);
}

fn span_attr(cell: ElementRef<'_>, name: &str) -> usize {
    cell.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

/// Cell text with whitespace runs collapsed to a single space.
fn cell_text(cell: ElementRef<'_>) -> String {
    let raw: String = cell.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_874;

    fn texts(ds: &Dataset) -> Vec<Vec<String>> {
        ds.rows()
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_simple_table() {
        let ds = first_table(
            "<table><tr><th>Name</th><th>Score</th></tr>\
             <tr><td>Ann</td><td>90</td></tr><tr><td>Bo</td><td>85</td></tr></table>",
        )
        .unwrap();
        assert_eq!(ds.columns(), &["Name", "Score"]);
        assert_eq!(texts(&ds), vec![vec!["Ann", "90"], vec!["Bo", "85"]]);
    }

    #[test]
    fn test_first_table_wins() {
        let ds = first_table(
            "<p>intro</p><table><tr><td>first</td></tr></table>\
             <table><tr><td>second</td></tr></table>",
        )
        .unwrap();
        assert_eq!(ds.columns(), &["first"]);
    }

    #[test]
    fn test_nested_table_rows_ignored() {
        let ds = first_table(
            "<table><tr><td>outer</td></tr>\
             <tr><td><table><tr><td>inner</td></tr></table></td></tr></table>",
        )
        .unwrap();
        assert_eq!(ds.columns(), &["outer"]);
        assert_eq!(ds.row_count(), 1);
    }

    #[test]
    fn test_thead_and_tbody() {
        let ds = first_table(
            "<table><thead><tr><th>a</th><th>b</th></tr></thead>\
             <tbody><tr><td>1</td><td></td></tr></tbody></table>",
        )
        .unwrap();
        assert_eq!(ds.columns(), &["a", "b"]);
        assert_eq!(ds.rows()[0], vec![Cell::Text("1".into()), Cell::Empty]);
    }

    #[test]
    fn test_spans_expanded() {
        let ds = first_table(
            "<table><tr><th colspan=\"2\">name</th><th>room</th></tr>\
             <tr><td>A</td><td>B</td><td rowspan=\"2\">101</td></tr>\
             <tr><td>C</td><td>D</td></tr></table>",
        )
        .unwrap();
        assert_eq!(ds.columns(), &["name", "name", "room"]);
        assert_eq!(
            texts(&ds),
            vec![vec!["A", "B", "101"], vec!["C", "D", "101"]]
        );
    }

    #[test]
    fn test_whitespace_collapsed() {
        let ds = first_table("<table><tr><td>\n  Mr.\n   Somchai  </td></tr></table>").unwrap();
        assert_eq!(ds.columns(), &["Mr. Somchai"]);
    }

    #[test]
    fn test_ragged_rows_padded() {
        let ds = first_table(
            "<table><tr><td>a</td></tr><tr><td>1</td><td>2</td></tr></table>",
        )
        .unwrap();
        assert_eq!(ds.columns(), &["a", "Unnamed: 1"]);
        assert_eq!(texts(&ds), vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_no_table() {
        let err = first_table("<html><body><p>nothing</p></body></html>").unwrap_err();
        assert!(matches!(err, ReadError::NoTableFound));

        let err = first_table("<table></table>").unwrap_err();
        assert!(matches!(err, ReadError::NoTableFound));

        let err = first_table("<table><tr><td> </td></tr></table>").unwrap_err();
        assert!(matches!(err, ReadError::NoTableFound));
    }

    #[test]
    fn test_empty_tables_skipped() {
        let ds = first_table(
            "<table></table>\
             <table><tr><td></td><td>&nbsp;</td></tr></table>\
             <table><tr><th>a</th></tr><tr><td>1</td></tr></table>",
        )
        .unwrap();
        assert_eq!(ds.columns(), &["a"]);
        assert_eq!(texts(&ds), vec![vec!["1"]]);
    }

    #[test]
    fn test_reader_reports_encoding() {
        let html = "<table><tr><th>ชื่อ</th></tr><tr><td>สมชาย</td></tr></table>";
        let (bytes, _, _) = WINDOWS_874.encode(html);

        let parsed = HtmlTableReader::default().read(&bytes).unwrap();
        assert_eq!(parsed.dataset.columns(), &["ชื่อ"]);
        assert_eq!(texts(&parsed.dataset), vec![vec!["สมชาย"]]);
        assert_eq!(
            parsed.format,
            SourceFormat::HtmlTable { encoding: "cp874".into(), lossy: false }
        );
    }
}
