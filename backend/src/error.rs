//! Error types for the xls2csv conversion pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ReadError`] - One table reader failed on the input bytes
//! - [`ConvertError`] - A single file could not be converted
//! - [`ConfigError`] - Invalid environment configuration
//! - [`ServerError`] - HTTP request handling errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Reader Errors
// =============================================================================

/// Failure of a single table reader.
///
/// These never reach the caller on their own; the sniffer collects them
/// into a [`FailureChain`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// The bytes are not a spreadsheet container calamine understands.
    #[error("not a spreadsheet: {0}")]
    Spreadsheet(String),

    /// The workbook opened but has no worksheet.
    #[error("workbook has no sheets")]
    NoSheets,

    /// The document decoded but contains no usable `<table>`.
    #[error("no table found in HTML document")]
    NoTableFound,
}

/// One failed strategy in a sniffing run.
#[derive(Debug)]
pub struct Attempt {
    /// Name of the reader that failed.
    pub reader: &'static str,
    /// Why it failed.
    pub error: ReadError,
}

/// Ordered causes of a failed sniff, one per reader tried.
#[derive(Debug, Default)]
pub struct FailureChain(pub Vec<Attempt>);

impl FailureChain {
    pub fn push(&mut self, reader: &'static str, error: ReadError) {
        self.0.push(Attempt { reader, error });
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.0
    }

    /// Whether the last strategy got as far as parsing HTML but found nothing.
    pub fn ends_with_no_table(&self) -> bool {
        matches!(
            self.0.last(),
            Some(Attempt {
                error: ReadError::NoTableFound,
                ..
            })
        )
    }
}

impl fmt::Display for FailureChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no readers configured");
        }
        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", attempt.reader, attempt.error)?;
        }
        Ok(())
    }
}

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors while converting one file to CSV.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input path does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Failed to read input or write output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither a spreadsheet nor an HTML table could be read.
    #[error("Could not be read as a spreadsheet or an HTML table ({0})")]
    Unreadable(FailureChain),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },

    /// An encoding label has no known decoder.
    #[error("Unknown text encoding: '{0}'")]
    UnknownEncoding(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Uploaded files failed validation.
    #[error("{0}")]
    Validation(String),

    /// Malformed request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Multipart body could not be read (including oversize bodies).
    #[error("Upload error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    /// Conversion of a single upload failed.
    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    /// ZIP bundle could not be written.
    #[error("Failed to build ZIP: {0}")]
    Bundle(#[from] zip::result::ZipError),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for a single reader.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
