//! Domain models for the conversion pipeline.
//!
//! - [`Cell`] - A single typed cell value
//! - [`Dataset`] - Header row plus data rows of one table
//! - [`SourceFormat`] - Which reader produced a dataset

use chrono::NaiveDateTime;
use std::fmt;

// =============================================================================
// Cell
// =============================================================================

/// A cell value read from a spreadsheet or HTML table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// Floats with a smaller magnitude than this that have no fraction render as integers.
const WHOLE_FLOAT_LIMIT: f64 = 1e15;

impl Cell {
    /// Text cell, or [`Cell::Empty`] when the text is empty.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 && x.abs() < WHOLE_FLOAT_LIMIT {
                    write!(f, "{}", *x as i64)
                } else {
                    write!(f, "{}", x)
                }
            }
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// One table: ordered column names and rows of cells.
///
/// Every row has exactly `columns.len()` cells. Duplicate column names
/// are kept as-is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Build a dataset, padding short rows with empty cells and cutting long ones.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// =============================================================================
// Source Format
// =============================================================================

/// Which reader produced a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceFormat {
    /// A real spreadsheet container (`xls`, `xlsx`, `xlsb` or `ods`).
    Spreadsheet { kind: &'static str },
    /// An HTML document with a `<table>`, decoded with `encoding`.
    HtmlTable { encoding: String, lossy: bool },
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Spreadsheet { kind } => write!(f, "{} spreadsheet", kind),
            SourceFormat::HtmlTable { encoding, lossy: false } => {
                write!(f, "HTML table ({})", encoding)
            }
            SourceFormat::HtmlTable { encoding, lossy: true } => {
                write!(f, "HTML table ({}, with replacements)", encoding)
            }
        }
    }
}
