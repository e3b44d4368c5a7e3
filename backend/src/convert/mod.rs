//! Spreadsheet to CSV conversion.
//!
//! Ties the [`FormatSniffer`] to the CSV emitter:
//!
//! ```text
//! raw bytes ──▶ sniff (spreadsheet │ html table) ──▶ Dataset ──▶ CSV bytes (BOM)
//! ```
//!
//! A file either converts fully or fails with a [`ConvertError`]; there is no
//! partial output.

pub mod batch;
pub mod csv_out;

pub use batch::{batch_convert, find_xls_files, BatchReport};
pub use csv_out::{write_csv, UTF8_BOM};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, ConvertResult};
use crate::models::{Dataset, SourceFormat};
use crate::parser::{DecoderChain, FormatSniffer};

/// CSV output together with what was read.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub csv: Vec<u8>,
    pub format: SourceFormat,
    pub rows: usize,
    pub columns: usize,
}

/// Stateless converter; safe to share between threads.
#[derive(Debug, Default)]
pub struct Converter {
    sniffer: FormatSniffer,
}

impl Converter {
    pub fn new(decoders: DecoderChain) -> Self {
        Self {
            sniffer: FormatSniffer::new(decoders),
        }
    }

    /// Read the first table from `bytes`.
    pub fn read_dataset(&self, bytes: &[u8]) -> ConvertResult<(Dataset, SourceFormat)> {
        let parsed = self.sniffer.sniff(bytes).into_result()?;
        Ok((parsed.dataset, parsed.format))
    }

    /// Convert raw file bytes to CSV.
    pub fn convert_bytes(&self, bytes: &[u8]) -> ConvertResult<Conversion> {
        let (dataset, format) = self.read_dataset(bytes)?;
        Ok(Conversion {
            csv: write_csv(&dataset)?,
            format,
            rows: dataset.row_count(),
            columns: dataset.column_count(),
        })
    }

    /// Convert the file at `path` to CSV bytes.
    pub fn convert_file(&self, path: &Path) -> ConvertResult<Conversion> {
        if !path.exists() {
            return Err(ConvertError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        self.convert_bytes(&bytes)
    }

    /// Convert `input` and write the CSV to `output`, or next to the input
    /// with a `.csv` extension. Returns the destination path.
    pub fn convert_to_file(&self, input: &Path, output: Option<&Path>) -> ConvertResult<PathBuf> {
        let destination = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(input));

        let conversion = self.convert_file(input)?;
        fs::write(&destination, &conversion.csv)?;
        Ok(destination)
    }
}

/// `input` with its extension replaced by `.csv`.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("csv")
}

/// Convert bytes with the default decoder chain.
pub fn convert_bytes(bytes: &[u8]) -> ConvertResult<Vec<u8>> {
    Converter::default().convert_bytes(bytes).map(|c| c.csv)
}

/// Convert a file with the default decoder chain.
pub fn convert_file(path: &Path) -> ConvertResult<Vec<u8>> {
    Converter::default().convert_file(path).map(|c| c.csv)
}
