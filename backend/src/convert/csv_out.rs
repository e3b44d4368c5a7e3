//! CSV emission: UTF-8 with BOM, comma-delimited, header row first.

use crate::error::{ConvertError, ConvertResult};
use crate::models::Dataset;

/// UTF-8 byte-order-mark written before any CSV content.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize a dataset to CSV bytes.
///
/// Output is deterministic: the same dataset always gives the same bytes.
/// A dataset without columns yields only the BOM.
pub fn write_csv(dataset: &Dataset) -> ConvertResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(UTF8_BOM.to_vec());

    if !dataset.is_empty() {
        writer.write_record(dataset.columns())?;
        for row in dataset.rows() {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| ConvertError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn body(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).expect("missing BOM")).unwrap()
    }

    #[test]
    fn test_scores() {
        let ds = Dataset::new(
            vec!["Name".into(), "Score".into()],
            vec![
                vec![Cell::text("Ann"), Cell::Float(90.0)],
                vec![Cell::text("Bo"), Cell::Int(85)],
            ],
        );
        let bytes = write_csv(&ds).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(body(&bytes), "Name,Score\nAnn,90\nBo,85\n");
    }

    #[test]
    fn test_quoting_and_empty_cells() {
        let ds = Dataset::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![Cell::text("x, y"), Cell::Empty, Cell::text("say \"hi\"")]],
        );
        let bytes = write_csv(&ds).unwrap();
        assert_eq!(body(&bytes), "a,b,c\n\"x, y\",,\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_thai_text_is_utf8() {
        let ds = Dataset::new(vec!["ชื่อ".into()], vec![vec![Cell::text("สมชาย")]]);
        let bytes = write_csv(&ds).unwrap();
        assert_eq!(body(&bytes), "ชื่อ\nสมชาย\n");
    }

    #[test]
    fn test_deterministic() {
        let ds = Dataset::new(
            vec!["n".into(), "n".into()],
            vec![vec![Cell::Float(0.1), Cell::Bool(false)]],
        );
        assert_eq!(write_csv(&ds).unwrap(), write_csv(&ds).unwrap());
    }

    #[test]
    fn test_empty_dataset_is_bom_only() {
        assert_eq!(write_csv(&Dataset::default()).unwrap(), UTF8_BOM);
    }
}
