//! Text decoding with an ordered fallback chain of encodings.
//!
//! Legacy report exporters write HTML in single-byte Thai encodings without
//! declaring a charset. Each configured encoding is tried strictly, in order;
//! the first that decodes without a malformed sequence wins. When all fail,
//! the bytes are decoded as UTF-8 with U+FFFD replacements, which never fails.

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;

use crate::error::ConfigError;

/// Default decoding order.
pub const DEFAULT_ENCODINGS: &[&str] = &["utf-8", "cp874", "tis-620", "iso-8859-11", "windows-874"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Resolve an encoding label, accepting common aliases that the WHATWG
/// registry in encoding_rs does not list.
pub fn resolve_label(label: &str) -> Option<&'static Encoding> {
    let normalized = label.trim().to_lowercase();
    let canonical = match normalized.as_str() {
        "utf8" => "utf-8",
        "cp874" | "cp-874" | "windows874" | "tis620" | "x-windows-874" => "windows-874",
        "iso8859_11" | "iso-8859_11" => "iso-8859-11",
        other => other,
    };
    Encoding::for_label(canonical.as_bytes())
}

/// One strict decoding step.
#[derive(Debug, Clone)]
pub struct TextDecoder {
    label: String,
    encoding: &'static Encoding,
}

impl TextDecoder {
    pub fn new(label: &str) -> Result<Self, ConfigError> {
        let encoding =
            resolve_label(label).ok_or_else(|| ConfigError::UnknownEncoding(label.to_string()))?;
        Ok(Self {
            label: label.trim().to_lowercase(),
            encoding,
        })
    }

    /// Label as configured (e.g. `tis-620`), not the canonical encoding name.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Decode without replacement; `None` on any malformed sequence.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
    }
}

/// Text produced by a [`DecoderChain`].
#[derive(Debug)]
pub struct Decoded<'a> {
    pub text: Cow<'a, str>,
    /// Label of the decoder that succeeded, or `utf-8` for the lossy fallback.
    pub encoding: String,
    /// True when the lossy fallback was used.
    pub lossy: bool,
}

/// Ordered list of strict decoders, ending in lossy UTF-8.
#[derive(Debug, Clone)]
pub struct DecoderChain {
    decoders: Vec<TextDecoder>,
}

impl DecoderChain {
    pub fn from_labels<I, S>(labels: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let decoders = labels
            .into_iter()
            .map(|label| TextDecoder::new(label.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { decoders })
    }

    /// Append another encoding to try after the existing ones.
    pub fn push(&mut self, label: &str) -> Result<(), ConfigError> {
        self.decoders.push(TextDecoder::new(label)?);
        Ok(())
    }

    pub fn labels(&self) -> Vec<&str> {
        self.decoders.iter().map(TextDecoder::label).collect()
    }

    /// Decode `bytes`. Never fails.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Decoded<'a> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        for decoder in &self.decoders {
            if let Some(text) = decoder.decode(bytes) {
                return Decoded {
                    text,
                    encoding: decoder.label().to_string(),
                    lossy: false,
                };
            }
        }

        let (text, _) = UTF_8.decode_without_bom_handling(bytes);
        Decoded {
            text,
            encoding: "utf-8".to_string(),
            lossy: true,
        }
    }
}

impl Default for DecoderChain {
    fn default() -> Self {
        let decoders = DEFAULT_ENCODINGS
            .iter()
            .filter_map(|label| TextDecoder::new(label).ok())
            .collect();
        Self { decoders }
    }
}
