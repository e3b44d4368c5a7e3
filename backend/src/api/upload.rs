//! Upload validation and per-request temporary storage.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Extensions accepted by `POST /convert` (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &["xls", "xlsx"];

/// Stem used when nothing survives sanitizing.
const FALLBACK_STEM: &str = "converted";

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static pattern"));

/// A file received in the `files` multipart field.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        is_allowed(&self.file_name)
    }

    /// Name of the CSV produced from this upload.
    pub fn csv_name(&self) -> String {
        csv_name(&self.file_name)
    }
}

/// True when `file_name` has an `xls`/`xlsx` extension, any case.
pub fn is_allowed(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}

/// Reduce a client-supplied name to `[A-Za-z0-9_.-]`, dropping path parts
/// and non-ASCII characters (accents are dropped, not folded: `café` becomes
/// `caf`). May return an empty string.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    UNSAFE_CHARS
        .replace_all(&joined, "")
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}

/// Sanitized file name with its extension replaced by `.csv`.
///
/// Falls back to `converted.csv` when nothing survives sanitizing.
pub fn csv_name(file_name: &str) -> String {
    let base = file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file_name);
    let secured = secure_filename(base);
    if secured.is_empty() {
        return format!("{}.csv", FALLBACK_STEM);
    }
    Path::new(&secured)
        .with_extension("csv")
        .to_string_lossy()
        .into_owned()
}

/// Temporary directory holding one request's uploads.
///
/// The directory and everything in it is removed when this value is
/// dropped, on success and error paths alike.
#[derive(Debug)]
pub struct UploadWorkspace {
    dir: TempDir,
}

impl UploadWorkspace {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("xls2csv-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an upload to disk. `index` keeps same-named uploads apart.
    pub async fn save(&self, index: usize, upload: &UploadedFile) -> io::Result<PathBuf> {
        let name = match secure_filename(&upload.file_name) {
            s if s.is_empty() => "upload".to_string(),
            s => s,
        };
        let path = self.dir.path().join(format!("{}_{}", index, name));
        tokio::fs::write(&path, &upload.bytes).await?;
        Ok(path)
    }
}
