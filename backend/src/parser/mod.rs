//! Spreadsheet to JSON rows, with format, encoding and delimiter detection.
//!
//! Every data row becomes a JSON object keyed by the header row. Nothing
//! quiz-specific happens here; required columns are checked by
//! [`crate::transform::row`].
//!
//! Supported inputs:
//! - Excel and OpenDocument workbooks, see [`workbook`]
//! - CSV in UTF-8, ISO-8859-1 or Windows-1252, with `;`, `,`, tab or `|`

pub mod workbook;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::path::Path;

use crate::error::{SheetError, SheetResult};

pub use workbook::{cell_to_value, parse_workbook_bytes};

/// File formats the row source understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Ods,
    Csv,
}

impl SheetFormat {
    /// Guess from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xlam" => Some(Self::Xlsx),
            "xls" | "xla" => Some(Self::Xls),
            "ods" => Some(Self::Ods),
            "csv" | "tsv" | "txt" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Guess from the leading bytes: zip container, OLE2 container, else CSV.
    pub fn sniff(bytes: &[u8]) -> Self {
        const ZIP: &[u8] = b"PK\x03\x04";
        const OLE2: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

        if bytes.starts_with(ZIP) {
            // ODS stores its mimetype uncompressed as the first entry
            if bytes.len() > 80 && bytes[30..80].windows(11).any(|w| w == b"opendocumen") {
                Self::Ods
            } else {
                Self::Xlsx
            }
        } else if bytes.starts_with(OLE2) {
            Self::Xls
        } else {
            Self::Csv
        }
    }

    /// Extension first, content sniffing as a fallback.
    pub fn detect(file_name: Option<&str>, bytes: &[u8]) -> Self {
        file_name
            .and_then(Self::from_file_name)
            .unwrap_or_else(|| Self::sniff(bytes))
    }
}

impl std::fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Ods => "ods",
            Self::Csv => "csv",
        };
        f.write_str(name)
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows as JSON objects
    pub records: Vec<Value>,
    /// Header row, trimmed
    pub headers: Vec<String>,
    /// Detected format
    pub format: SheetFormat,
    /// Worksheet that was read (workbooks only)
    pub sheet_name: Option<String>,
    /// Detected encoding (CSV only)
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only)
    pub delimiter: Option<char>,
}

/// Parse a spreadsheet file, detecting its format.
pub fn parse_file<P: AsRef<Path>>(path: P) -> SheetResult<ParseResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path.file_name().and_then(|n| n.to_str());
    parse_bytes(&bytes, SheetFormat::detect(name, &bytes))
}

/// Parse raw bytes in the given format.
pub fn parse_bytes(bytes: &[u8], format: SheetFormat) -> SheetResult<ParseResult> {
    if bytes.is_empty() {
        return Err(SheetError::EmptyFile);
    }

    match format {
        SheetFormat::Csv => parse_csv_bytes(bytes),
        _ => parse_workbook_bytes(bytes, format),
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> SheetResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => {
            let (text, had_errors) = encoding_rs::UTF_8.decode_without_bom_handling(bytes);
            if had_errors {
                return Err(SheetError::Encoding {
                    encoding: encoding.to_string(),
                    message: "invalid byte sequence".to_string(),
                });
            }
            text
        }
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0,
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0,
        _ => String::from_utf8_lossy(bytes),
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for sep in [';', ',', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes(bytes: &[u8]) -> SheetResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    let mut result = parse_csv_str(&content, delimiter)?;
    result.encoding = Some(encoding);
    Ok(result)
}

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```
/// use quizstats::parser::parse_csv_str;
///
/// let result = parse_csv_str("Question ID;Overall Attempt\nq1;87.5", ';').unwrap();
/// assert_eq!(result.records[0]["Question ID"], "q1");
/// assert_eq!(result.records[0]["Overall Attempt"], 87.5);
/// ```
pub fn parse_csv_str(content: &str, delimiter: char) -> SheetResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(SheetError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(SheetError::NoHeaders);
    }

    let mut records = Vec::new();

    for result in reader.records() {
        let record = result?;

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).map(infer_scalar).unwrap_or(Value::Null);
            obj.insert(header.clone(), value);
        }
        records.push(Value::Object(obj));
    }

    Ok(ParseResult {
        records,
        headers,
        format: SheetFormat::Csv,
        sheet_name: None,
        encoding: None,
        delimiter: Some(delimiter),
    })
}

/// Give a CSV cell the type a spreadsheet would have given it:
/// empty -> null, integer -> integer, decimal -> float, else text.
///
/// Only plainly written numbers are converted. Text with leading zeros, an
/// exponent or a sign prefix, and integers too long for `i64`, stay text so
/// identifiers such as `000000000000000000000001` come through unchanged.
pub fn infer_scalar(raw: &str) -> Value {
    let raw = raw.trim();
    let text = || Value::String(raw.to_string());

    if raw.is_empty() {
        return Value::Null;
    }
    if !is_plain_number(raw) {
        return text();
    }
    if raw.contains('.') {
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(text)
    } else {
        raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| text())
    }
}

/// `-?(0|[1-9][0-9]*)(\.[0-9]+)?`
fn is_plain_number(raw: &str) -> bool {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    digits(int) && (int == "0" || !int.starts_with('0')) && frac.map_or(true, digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_csv() {
        let csv = "name;age\nAlice;30\nBob;25";
        let result = parse_csv_str(csv, ';').unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0]["name"], "Alice");
        assert_eq!(result.records[0]["age"], 30);
        assert_eq!(result.records[1]["name"], "Bob");
    }

    #[test]
    fn test_quoted_values_with_delimiter_inside() {
        let csv = "name,value\n\"Smith, Alice\",\"Hello World\"";
        let result = parse_csv_str(csv, ',').unwrap();

        assert_eq!(result.records[0]["name"], "Smith, Alice");
        assert_eq!(result.records[0]["value"], "Hello World");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let csv = "a;b\n1;2\n\n;\n3;4\n";
        let result = parse_csv_str(csv, ';').unwrap();
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn test_short_rows_fill_null() {
        let csv = "a;b;c\n1;;3\n4";
        let result = parse_csv_str(csv, ';').unwrap();

        assert_eq!(result.records[0]["b"], Value::Null);
        assert_eq!(result.records[1]["a"], 4);
        assert_eq!(result.records[1]["c"], Value::Null);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "a;b\n1;2;3;4";
        let result = parse_csv_str(csv, ';').unwrap();
        assert_eq!(result.records[0].as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_times_stay_text() {
        let csv = "Overall Time Spent,Toppers Time Spent\n1:30,0:01:05";
        let result = parse_csv_str(csv, ',').unwrap();

        assert_eq!(result.records[0]["Overall Time Spent"], "1:30");
        assert_eq!(result.records[0]["Toppers Time Spent"], "0:01:05");
    }

    #[test]
    fn test_infer_scalar() {
        assert_eq!(infer_scalar(""), Value::Null);
        assert_eq!(infer_scalar("42"), json!(42));
        assert_eq!(infer_scalar("-3"), json!(-3));
        assert_eq!(infer_scalar("87.5"), json!(87.5));
        assert_eq!(infer_scalar("0.42"), json!(0.42));
        assert_eq!(infer_scalar("1e3"), json!("1e3"));
        assert_eq!(infer_scalar("MCQ"), json!("MCQ"));
        assert_eq!(infer_scalar("inf"), json!("inf"));
        assert_eq!(infer_scalar("507f1f77bcf86cd799439011"), json!("507f1f77bcf86cd799439011"));
        assert_eq!(infer_scalar("123456789012345678901234"), json!("123456789012345678901234"));
    }

    #[test]
    fn test_identifier_like_text_is_not_a_number() {
        assert_eq!(
            infer_scalar("000000000000000000000001"),
            json!("000000000000000000000001")
        );
        assert_eq!(infer_scalar("0123"), json!("0123"));
        assert_eq!(
            infer_scalar("12345678901234567890e123"),
            json!("12345678901234567890e123")
        );
        assert_eq!(infer_scalar("+5"), json!("+5"));
        assert_eq!(infer_scalar("1."), json!("1."));
        assert_eq!(infer_scalar("0"), json!(0));
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_csv_str("", ';'), Err(SheetError::EmptyFile)));
        assert!(matches!(parse_bytes(b"", SheetFormat::Csv), Err(SheetError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "name;age\nAlice;30\nBob;25";
        let result = parse_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(result.delimiter, Some(';'));
        assert_eq!(result.encoding.as_deref(), Some("utf-8"));
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let csv = "\u{feff}Question ID,Type\nq1,MCQ";
        let result = parse_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(result.headers[0], "Question ID");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SheetFormat::from_file_name("stats.XLSX"), Some(SheetFormat::Xlsx));
        assert_eq!(SheetFormat::from_file_name("stats.xls"), Some(SheetFormat::Xls));
        assert_eq!(SheetFormat::from_file_name("stats.ods"), Some(SheetFormat::Ods));
        assert_eq!(SheetFormat::from_file_name("stats.csv"), Some(SheetFormat::Csv));
        assert_eq!(SheetFormat::from_file_name("stats"), None);

        assert_eq!(SheetFormat::sniff(b"PK\x03\x04rest"), SheetFormat::Xlsx);
        assert_eq!(
            SheetFormat::sniff(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0]),
            SheetFormat::Xls
        );
        assert_eq!(SheetFormat::sniff(b"Question ID,Type"), SheetFormat::Csv);

        assert_eq!(SheetFormat::detect(Some("upload.bin"), b"PK\x03\x04"), SheetFormat::Xlsx);
        assert_eq!(SheetFormat::detect(Some("a.csv"), b"PK\x03\x04"), SheetFormat::Csv);
        assert_eq!(SheetFormat::detect(None, b"a,b"), SheetFormat::Csv);
    }

    #[test]
    fn test_parse_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        std::fs::write(&path, "Question ID,Type\nq1,MCQ\nq2,Numeric\n").unwrap();

        let result = parse_file(&path).unwrap();
        assert_eq!(result.format, SheetFormat::Csv);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[1]["Type"], "Numeric");
    }

    #[test]
    fn test_broken_workbook_is_an_error() {
        let err = parse_bytes(b"PK\x03\x04not really a zip", SheetFormat::Xlsx).unwrap_err();
        assert!(matches!(err, SheetError::Workbook(_)));
    }
}
