//! Directory batch conversion.
//!
//! Files are processed one at a time in sorted order. A failure on one file
//! is recorded and the batch moves on.

use std::fs;
use std::path::{Path, PathBuf};

use super::Converter;
use crate::error::{ConvertError, ConvertResult};

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Every `.xls` file found, in processing order.
    pub found: Vec<PathBuf>,
    /// `(source, destination)` for each converted file.
    pub converted: Vec<(PathBuf, PathBuf)>,
    /// `(source, error)` for each failed file.
    pub failed: Vec<(PathBuf, ConvertError)>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}

/// `.xls` files directly inside `dir` (not recursive), sorted by path.
pub fn find_xls_files(dir: &Path) -> ConvertResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ConvertError::NotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_xls_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

fn has_xls_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xls"))
        .unwrap_or(false)
}

/// Convert every `.xls` in `input_dir`, writing `<stem>.csv` into
/// `output_dir` (created if missing) or next to the inputs.
///
/// Only a missing input directory or an uncreatable output directory fails
/// the whole batch; per-file errors land in [`BatchReport::failed`].
pub fn batch_convert(
    converter: &Converter,
    input_dir: &Path,
    output_dir: Option<&Path>,
) -> ConvertResult<BatchReport> {
    let found = find_xls_files(input_dir)?;

    let output_dir = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir
        }
        None => input_dir,
    };

    let mut report = BatchReport::default();
    for source in &found {
        let destination = match source.file_name() {
            Some(name) => output_dir.join(name).with_extension("csv"),
            None => continue,
        };

        match converter.convert_to_file(source, Some(&destination)) {
            Ok(dest) => report.converted.push((source.clone(), dest)),
            Err(e) => report.failed.push((source.clone(), e)),
        }
    }
    report.found = found;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TABLE: &[u8] = b"<table><tr><th>a</th></tr><tr><td>1</td></tr></table>";

    #[test]
    fn test_find_is_sorted_and_non_recursive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.xls"), TABLE).unwrap();
        fs::write(dir.path().join("a.XLS"), TABLE).unwrap();
        fs::write(dir.path().join("c.xlsx"), TABLE).unwrap();
        fs::write(dir.path().join("d.txt"), TABLE).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/e.xls"), TABLE).unwrap();

        let files = find_xls_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.XLS", "b.xls"]);
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempdir().unwrap();
        let err = batch_convert(&Converter::default(), &dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, ConvertError::NotFound(_)));
    }

    #[test]
    fn test_output_dir_created() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.xls"), TABLE).unwrap();
        let out = dir.path().join("out/nested");

        let report = batch_convert(&Converter::default(), dir.path(), Some(&out)).unwrap();
        assert_eq!(report.converted.len(), 1);
        assert!(out.join("one.csv").is_file());
    }

    #[test]
    fn test_empty_dir() {
        let dir = tempdir().unwrap();
        let report = batch_convert(&Converter::default(), dir.path(), None).unwrap();
        assert!(report.is_empty());
    }
}
