//! Runtime configuration from environment variables (and `.env`).
//!
//! | Variable                   | Default                                        |
//! |----------------------------|------------------------------------------------|
//! | `XLS2CSV_HOST`             | `0.0.0.0`                                      |
//! | `XLS2CSV_PORT`             | `8000`                                         |
//! | `XLS2CSV_MAX_UPLOAD_BYTES` | `104857600` (100 MiB)                          |
//! | `XLS2CSV_ENCODINGS`        | `utf-8,cp874,tis-620,iso-8859-11,windows-874`  |

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::parser::{DecoderChain, DEFAULT_ENCODINGS};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub encodings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            encodings: DEFAULT_ENCODINGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load from the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Decoder chain from `XLS2CSV_ENCODINGS` alone; server settings are not read.
    pub fn decoders_from_env() -> Result<DecoderChain, ConfigError> {
        Self::decoders_from_lookup(|key| env::var(key).ok())
    }

    pub fn decoders_from_lookup<F>(lookup: F) -> Result<DecoderChain, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let encodings = encodings_var(&lookup)?.unwrap_or_else(|| Self::default().encodings);
        DecoderChain::from_labels(&encodings)
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = parse_var(&lookup, "XLS2CSV_HOST")?.unwrap_or(defaults.host);
        let port = parse_var(&lookup, "XLS2CSV_PORT")?.unwrap_or(defaults.port);
        let max_upload_bytes =
            parse_var(&lookup, "XLS2CSV_MAX_UPLOAD_BYTES")?.unwrap_or(defaults.max_upload_bytes);

        let encodings = encodings_var(&lookup)?.unwrap_or(defaults.encodings);

        let config = Self {
            host,
            port,
            max_upload_bytes,
            encodings,
        };
        // Unknown labels are rejected at load time.
        config.decoder_chain()?;
        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn decoder_chain(&self) -> Result<DecoderChain, ConfigError> {
        DecoderChain::from_labels(&self.encodings)
    }
}

/// Comma-separated labels from `XLS2CSV_ENCODINGS`, if set.
fn encodings_var<F>(lookup: &F) -> Result<Option<Vec<String>>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup("XLS2CSV_ENCODINGS") {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let labels: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if labels.is_empty() {
        return Err(ConfigError::Invalid {
            key: "XLS2CSV_ENCODINGS".into(),
            value: raw,
        });
    }
    Ok(Some(labels))
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_upload_bytes, 104_857_600);
        assert_eq!(config.encodings, DEFAULT_ENCODINGS);
        assert_eq!(config.addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("XLS2CSV_PORT", "9090"),
            ("XLS2CSV_HOST", "127.0.0.1"),
            ("XLS2CSV_ENCODINGS", "utf-8, windows-1252"),
        ]))
        .unwrap();
        assert_eq!(config.addr().to_string(), "127.0.0.1:9090");
        assert_eq!(config.decoder_chain().unwrap().labels(), vec!["utf-8", "windows-1252"]);
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("XLS2CSV_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "XLS2CSV_PORT"));
    }

    #[test]
    fn test_unknown_encoding_rejected_at_load() {
        let err = Config::from_lookup(lookup(&[("XLS2CSV_ENCODINGS", "utf-8,nope")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEncoding(_)));
    }

    #[test]
    fn test_decoders_ignore_server_settings() {
        let chain = Config::decoders_from_lookup(lookup(&[
            ("XLS2CSV_PORT", "eighty"),
            ("XLS2CSV_HOST", "not-an-ip"),
        ]))
        .unwrap();
        assert_eq!(chain.labels(), DEFAULT_ENCODINGS.to_vec());

        let chain = Config::decoders_from_lookup(lookup(&[("XLS2CSV_ENCODINGS", "windows-874")]))
            .unwrap();
        assert_eq!(chain.labels(), vec!["windows-874"]);

        let err = Config::decoders_from_lookup(lookup(&[("XLS2CSV_ENCODINGS", " , ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_with_port() {
        assert_eq!(Config::default().with_port(1234).port, 1234);
    }
}
