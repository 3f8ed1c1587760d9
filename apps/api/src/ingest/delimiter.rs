use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const COMMA: u8 = b',';
pub const SEMICOLON: u8 = b';';

/// Picks the field separator by counting `,` against `;` in the file's
/// first line. Detection is a heuristic and must never block ingestion: an
/// unreadable file or an empty first line falls back to comma.
pub fn detect_delimiter(path: &Path) -> u8 {
    match first_line(path) {
        Some(line) => delimiter_for_line(&line),
        None => COMMA,
    }
}

/// Semicolon wins only when strictly more frequent; ties go to comma.
pub fn delimiter_for_line(line: &str) -> u8 {
    let commas = line.bytes().filter(|&b| b == COMMA).count();
    let semicolons = line.bytes().filter(|&b| b == SEMICOLON).count();
    if semicolons > commas {
        SEMICOLON
    } else {
        COMMA
    }
}

fn first_line(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line).ok()?;
    Some(line)
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
    fn test_semicolon_majority_wins() {
        assert_eq!(delimiter_for_line("fecha;impresiones;me gusta"), SEMICOLON);
    }

    #[test]
    fn test_tie_falls_back_to_comma() {
        assert_eq!(delimiter_for_line("a;b,c"), COMMA);
    }

    #[test]
    fn test_comma_majority_wins() {
        assert_eq!(delimiter_for_line("date,impressions,likes"), COMMA);
    }

    #[test]
    fn test_line_without_separators_defaults_to_comma() {
        assert_eq!(delimiter_for_line("impresiones"), COMMA);
        assert_eq!(delimiter_for_line(""), COMMA);
    }

    #[test]
    fn test_only_first_line_is_counted() {
        let file = file_with("a,b,c\nx;y;z;w;v\n");
        assert_eq!(detect_delimiter(file.path()), COMMA);
    }

    #[test]
    fn test_semicolon_file() {
        let file = file_with("fecha;impresiones\n2024-01-01;10\n");
        assert_eq!(detect_delimiter(file.path()), SEMICOLON);
    }

    #[test]
    fn test_unreadable_file_defaults_to_comma() {
        assert_eq!(
            detect_delimiter(Path::new("/nonexistent/export.csv")),
            COMMA
        );
    }
}
