//! Tabular input reading with format, encoding and delimiter auto-detection.
//!
//! Converts uploaded bytes into a generic [`Table`] of JSON row objects.
//! XLSX input is detected by its ZIP magic and handed to [`xlsx`];
//! everything else is treated as delimited text. No timesheet-specific
//! logic here.

use serde_json::{json, Map, Value};
use std::path::Path;

use crate::error::{ReadError, ReadResult};

pub mod xlsx;

/// Input format detected from the uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Xlsx,
    Csv,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

/// A fully materialized input table with parsing metadata.
#[derive(Debug, Clone)]
pub struct Table {
    /// Parsed rows as JSON objects keyed by column header.
    pub records: Vec<Value>,
    /// Column headers in source order.
    pub headers: Vec<String>,
    /// Detected input format.
    pub format: InputFormat,
    /// Detected text encoding (`binary` for XLSX input).
    pub encoding: String,
    /// Detected delimiter for CSV input.
    pub delimiter: Option<char>,
}

/// Read a table from raw uploaded bytes, auto-detecting the format.
pub fn read_bytes(bytes: &[u8]) -> ReadResult<Table> {
    if bytes.starts_with(b"PK\x03\x04") {
        return xlsx::read_xlsx_bytes(bytes);
    }
    read_csv_bytes(bytes)
}

/// Read a table from a file on disk.
pub fn read_file<P: AsRef<Path>>(path: P) -> ReadResult<Table> {
    let bytes = std::fs::read(path.as_ref())?;
    read_bytes(&bytes)
}

// =============================================================================
// CSV Reading
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "iso-8859-2" | "latin-2" | "latin2" => "iso-8859-2".to_string(),
        "windows-1250" | "cp1250" => "windows-1250".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the detected encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ReadResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        // Polish timesheets commonly arrive in these
        "iso-8859-2" | "latin-2" | "latin2" => encoding_rs::ISO_8859_2.decode(bytes).0.to_string(),
        "windows-1250" | "cp1250" => encoding_rs::WINDOWS_1250.decode(bytes).0.to_string(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    };
    Ok(decoded)
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn read_csv_bytes(bytes: &[u8]) -> ReadResult<Table> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    // Excel-exported CSVs lead with a BOM
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = detect_delimiter(content);
    parse_csv_content(content, delimiter, encoding)
}

/// Parse decoded CSV text with an explicit delimiter.
pub fn parse_csv_content(content: &str, delimiter: char, encoding: String) -> ReadResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReadError::Parse(format!("Cannot read header row: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ReadError::NoHeaders);
    }

    let mut records = Vec::new();

    for (line_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            // +2: 1-based line numbers plus the header row
            ReadError::Parse(format!("Line {}: {}", line_idx + 2, e))
        })?;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let raw_value = record.get(i).map(|s| s.trim()).unwrap_or("");
            obj.insert(header.clone(), json!(raw_value));
        }
        records.push(Value::Object(obj));
    }

    Ok(Table {
        records,
        headers,
        format: InputFormat::Csv,
        encoding,
        delimiter: Some(delimiter),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let csv = "name;age\nAlice;30\nBob;25";
        let table = read_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0]["name"], "Alice");
        assert_eq!(table.records[0]["age"], "30");
        assert_eq!(table.records[1]["name"], "Bob");
        assert_eq!(table.headers, vec!["name", "age"]);
        assert_eq!(table.format, InputFormat::Csv);
    }

    #[test]
    fn test_comma_delimiter_detected() {
        let csv = "a,b,c\n1,2,3";
        let table = read_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.delimiter, Some(','));
        assert_eq!(table.records[0]["a"], "1");
        assert_eq!(table.records[0]["c"], "3");
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name;value\n\"Alice\";\"Hello; World\"";
        let table = read_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.records[0]["name"], "Alice");
        assert_eq!(table.records[0]["value"], "Hello; World");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let csv = "a;b\n1;2\n;\n3;4\n";
        let table = read_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.records.len(), 2);
    }

    #[test]
    fn test_missing_values_become_empty() {
        let csv = "a;b;c\n1;;3";
        let table = read_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.records[0]["a"], "1");
        assert_eq!(table.records[0]["b"], "");
        assert_eq!(table.records[0]["c"], "3");
    }

    #[test]
    fn test_short_rows_padded() {
        let csv = "a;b;c\n1;2";
        let table = read_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.records[0]["c"], "");
    }

    #[test]
    fn test_detect_delimiter_variants() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_latin2_decoding() {
        // "Spółka" in ISO-8859-2
        let bytes: &[u8] = &[0x53, 0x70, 0xF3, 0xB3, 0x6B, 0x61];
        let decoded = decode_content(bytes, "iso-8859-2").unwrap();
        assert_eq!(decoded, "Spółka");
    }

    #[test]
    fn test_bom_stripped_from_first_header() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"a;b\n1;2");
        let table = read_csv_bytes(&bytes).unwrap();

        assert_eq!(table.headers[0], "a");
    }

    #[test]
    fn test_utf8_passthrough() {
        let csv = "User;Spółka (user field)\nAlice;Beta Sp. z o.o.";
        let table = read_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.headers[1], "Spółka (user field)");
        assert_eq!(table.records[0]["Spółka (user field)"], "Beta Sp. z o.o.");
    }

    #[test]
    fn test_xlsx_magic_routes_to_workbook_reader() {
        // A ZIP header that is not a real workbook must fail as a workbook,
        // not be misread as CSV.
        let bytes = b"PK\x03\x04not a real archive";
        let err = read_bytes(bytes).unwrap_err();
        assert!(matches!(err, ReadError::Workbook(_)));
    }
}
