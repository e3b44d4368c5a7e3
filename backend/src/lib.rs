//! # xls2csv - spreadsheet exports to UTF-8 CSV
//!
//! Converts `.xls`/`.xlsx` files into comma-delimited UTF-8 CSV with a
//! byte-order-mark. Many `.xls` reports are really HTML tables, often in a
//! legacy Thai encoding; those are detected and decoded automatically.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ .xls/.xlsx  │────▶│   Sniffer    │────▶│   Dataset   │────▶│  CSV + BOM  │
//! │  (or HTML)  │     │ (sheet│html) │     │ (1st table) │     │   (UTF-8)   │
//! └─────────────┘     └──────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xls2csv::Converter;
//! use std::path::Path;
//!
//! let converter = Converter::default();
//! let written = converter.convert_to_file(Path::new("report.xls"), None)?;
//! println!("wrote {}", written.display());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Dataset and cell values
//! - [`parser`] - Format sniffing, decoding, spreadsheet and HTML readers
//! - [`convert`] - Converter, CSV emission, batch conversion
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP upload server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Conversion
pub mod convert;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    Attempt, ConfigError, ConvertError, ConvertResult, FailureChain, ReadError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, Dataset, SourceFormat};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    DecoderChain, FormatSniffer, HtmlTableReader, Parsed, SniffOutcome, SpreadsheetReader,
    TableReader,
};

// =============================================================================
// Re-exports - Conversion
// =============================================================================

pub use convert::{
    batch_convert, convert_bytes, convert_file, default_output_path, write_csv, BatchReport,
    Conversion, Converter, UTF8_BOM,
};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::Config;

// Server
pub mod server {
    pub use crate::api::server::{respond, router, start_server, AppState};
}
