//! Format sniffing: binary spreadsheet first, HTML table second.
//!
//! Real-world `.xls` exports are often HTML documents with a spreadsheet
//! extension. The sniffer tries the structurally strict reader first so a
//! genuine workbook is never misread as HTML, then falls back to the lenient
//! one. Each reader returns a result; failures are collected in order and
//! only reported together.
//!
//! ```rust,ignore
//! use xls2csv::parser::{FormatSniffer, SniffOutcome};
//!
//! match FormatSniffer::default().sniff(&bytes) {
//!     SniffOutcome::Parsed(parsed) => println!("{} rows", parsed.dataset.row_count()),
//!     SniffOutcome::Unreadable(chain) => eprintln!("{}", chain),
//! }
//! ```

pub mod decode;
pub mod html;
pub mod spreadsheet;

pub use decode::{resolve_label, DecoderChain, Decoded, TextDecoder, DEFAULT_ENCODINGS};
pub use html::{first_table, HtmlTableReader};
pub use spreadsheet::SpreadsheetReader;

use crate::error::{ConvertError, FailureChain, ReadResult};
use crate::models::{Dataset, SourceFormat};

/// A dataset together with the reader format that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub dataset: Dataset,
    pub format: SourceFormat,
}

/// One parsing strategy in the sniffing chain.
pub trait TableReader: Send + Sync {
    /// Short name used in failure chains and logs.
    fn name(&self) -> &'static str;

    /// Read the first table out of `bytes`.
    fn read(&self, bytes: &[u8]) -> ReadResult<Parsed>;
}

/// Result of a sniffing run.
#[derive(Debug)]
pub enum SniffOutcome {
    /// A reader succeeded; later readers were not tried.
    Parsed(Parsed),
    /// Every reader failed, causes in the order tried.
    Unreadable(FailureChain),
}

impl SniffOutcome {
    pub fn into_result(self) -> Result<Parsed, ConvertError> {
        match self {
            SniffOutcome::Parsed(parsed) => Ok(parsed),
            SniffOutcome::Unreadable(chain) => Err(ConvertError::Unreadable(chain)),
        }
    }
}

/// Ordered list of [`TableReader`]s tried until one succeeds.
pub struct FormatSniffer {
    readers: Vec<Box<dyn TableReader>>,
}

impl FormatSniffer {
    /// Spreadsheet reader followed by an HTML reader using `decoders`.
    pub fn new(decoders: DecoderChain) -> Self {
        Self {
            readers: vec![
                Box::new(SpreadsheetReader),
                Box::new(HtmlTableReader::new(decoders)),
            ],
        }
    }

    /// Sniffer with an explicit reader order.
    pub fn with_readers(readers: Vec<Box<dyn TableReader>>) -> Self {
        Self { readers }
    }

    pub fn reader_names(&self) -> Vec<&'static str> {
        self.readers.iter().map(|r| r.name()).collect()
    }

    pub fn sniff(&self, bytes: &[u8]) -> SniffOutcome {
        let mut failures = FailureChain::default();

        for reader in &self.readers {
            match reader.read(bytes) {
                Ok(parsed) => return SniffOutcome::Parsed(parsed),
                Err(e) => failures.push(reader.name(), e),
            }
        }

        SniffOutcome::Unreadable(failures)
    }
}

impl Default for FormatSniffer {
    fn default() -> Self {
        Self::new(DecoderChain::default())
    }
}

impl std::fmt::Debug for FormatSniffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatSniffer")
            .field("readers", &self.reader_names())
            .finish()
    }
}
