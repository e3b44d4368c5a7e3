//! ZIP packaging for multi-file conversions.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Download name of the bundle.
pub const BUNDLE_NAME: &str = "converted_files.zip";

/// Pack `(entry name, contents)` pairs into a deflated ZIP archive.
///
/// Repeated names get `_1`, `_2`, ... inserted before the extension.
pub fn zip_bundle(entries: &[(String, Vec<u8>)]) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used = HashSet::new();
    for (name, contents) in entries {
        let name = unique_name(name, &mut used);
        zip.start_file(name, options)?;
        zip.write_all(contents)?;
    }

    Ok(zip.finish()?.into_inner())
}

fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{}", ext)),
        None => (name, String::new()),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_bundle_entries() {
        let bytes = zip_bundle(&[
            ("a.csv".to_string(), b"x\n1\n".to_vec()),
            ("b.csv".to_string(), b"y\n2\n".to_vec()),
        ])
        .unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut contents = String::new();
        archive
            .by_name("b.csv")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "y\n2\n");
    }

    #[test]
    fn test_duplicate_names_suffixed() {
        let mut used = HashSet::new();
        assert_eq!(unique_name("r.csv", &mut used), "r.csv");
        assert_eq!(unique_name("r.csv", &mut used), "r_1.csv");
        assert_eq!(unique_name("r.csv", &mut used), "r_2.csv");
        assert_eq!(unique_name("r_1.csv", &mut used), "r_1_1.csv");
    }

    #[test]
    fn test_empty_bundle_is_valid_zip() {
        let bytes = zip_bundle(&[]).unwrap();
        assert_eq!(ZipArchive::new(Cursor::new(bytes)).unwrap().len(), 0);
    }
}
