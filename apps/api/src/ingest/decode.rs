use std::collections::HashMap;
use std::path::Path;

use super::normalize::normalize_key;

/// One decoded row, keyed by normalized header labels. Plain map rather
/// than a struct: the set of columns is whatever the exporter emitted, and
/// schema interpretation happens later in the pipeline.
pub type NormalizedRecord = HashMap<String, String>;

/// Decodes a CSV file into normalized-key records.
///
/// Header labels go through [`normalize_key`]; cell values are trimmed
/// only. When two header labels normalize to the same key, the later
/// column wins. Rows shorter than the header simply leave the trailing
/// keys absent, and cells beyond the header are dropped.
pub fn decode_file(path: &Path, delimiter: u8) -> Result<Vec<NormalizedRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_key).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = NormalizedRecord::with_capacity(headers.len());
        for (key, value) in headers.iter().zip(row.iter()) {
            record.insert(key.clone(), value.trim().to_string());
        }
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_headers_are_normalized_and_values_trimmed() {
        let file = file_with("Fecha, Impresión ,Me gusta\n2024-01-01, 123 ,7\n");
        let records = decode_file(file.path(), b',').unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["fecha"], "2024-01-01");
        assert_eq!(records[0]["impresion"], "123");
        assert_eq!(records[0]["me_gusta"], "7");
    }

    #[test]
    fn test_semicolon_delimited_file() {
        let file = file_with("fecha;impresiones\n2024-01-02;456\n2024-01-03;789\n");
        let records = decode_file(file.path(), b';').unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["impresiones"], "789");
    }

    #[test]
    fn test_colliding_headers_last_column_wins() {
        let file = file_with("Likes,likes\n1,2\n");
        let records = decode_file(file.path(), b',').unwrap();

        assert_eq!(records[0]["likes"], "2");
    }

    #[test]
    fn test_short_rows_leave_keys_absent() {
        let file = file_with("fecha,impresiones,me_gusta\n2024-01-01,5\n");
        let records = decode_file(file.path(), b',').unwrap();

        assert_eq!(records[0].get("impresiones").map(String::as_str), Some("5"));
        assert_eq!(records[0].get("me_gusta"), None);
    }

    #[test]
    fn test_long_rows_drop_unlabeled_cells() {
        let file = file_with("fecha,impresiones\n2024-01-01,5,extra,cells\n");
        let records = decode_file(file.path(), b',').unwrap();

        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn test_empty_file_yields_no_records() {
        let file = file_with("");
        let records = decode_file(file.path(), b',').unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_header_only_file_yields_no_records() {
        let file = file_with("fecha,impresiones\n");
        let records = decode_file(file.path(), b',').unwrap();
        assert!(records.is_empty());
    }
}
