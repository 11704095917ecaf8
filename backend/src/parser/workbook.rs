//! Excel and OpenDocument workbooks via `calamine`.
//!
//! The first worksheet is read; its first row is the header row. Cells keep
//! their spreadsheet type where JSON has one. Time and duration cells are
//! rendered as `H:MM:SS` so that time columns formatted as Excel times read
//! the same as time columns typed in as text.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde_json::{Map, Number, Value};
use std::io::Cursor;

use super::{ParseResult, SheetFormat};
use crate::error::{SheetError, SheetResult};
use crate::transform::duration::format_hms;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Parse workbook bytes, reading the first worksheet.
pub fn parse_workbook_bytes(bytes: &[u8], format: SheetFormat) -> SheetResult<ParseResult> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let (headers, records) = rows_from_range(&range)?;

    Ok(ParseResult {
        records,
        headers,
        format,
        sheet_name: Some(sheet_name),
        encoding: None,
        delimiter: None,
    })
}

/// Split a cell range into trimmed headers and JSON rows.
///
/// Columns with an empty header are dropped, as are rows with no value.
pub fn rows_from_range(range: &Range<Data>) -> SheetResult<(Vec<String>, Vec<Value>)> {
    let mut rows = range.rows();
    let header_row = rows.next().ok_or(SheetError::EmptyFile)?;

    let headers: Vec<String> = header_row.iter().map(header_text).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SheetError::NoHeaders);
    }

    let mut records = Vec::new();
    for row in rows {
        let mut obj = Map::new();
        let mut blank = true;

        for (header, cell) in headers.iter().zip(row.iter().chain(std::iter::repeat(&Data::Empty))) {
            if header.is_empty() {
                continue;
            }
            let value = cell_to_value(cell);
            blank &= value.is_null();
            obj.insert(header.clone(), value);
        }

        if !blank {
            records.push(Value::Object(obj));
        }
    }

    Ok((headers.into_iter().filter(|h| !h.is_empty()).collect(), records))
}

/// Convert one cell to a JSON scalar.
pub fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::DateTime(dt) => excel_serial_to_value(dt.as_f64(), dt.is_duration()),
        Data::DurationIso(s) => iso_duration_seconds(s)
            .map(|secs| Value::String(format_hms(secs)))
            .unwrap_or_else(|| Value::String(s.clone())),
        Data::DateTimeIso(s) => Value::String(s.clone()),
    }
}

/// Durations and times of day (serial below one day) become `H:MM:SS`;
/// calendar dates stay as their serial number.
pub fn excel_serial_to_value(serial: f64, is_duration: bool) -> Value {
    if is_duration || (0.0..1.0).contains(&serial) {
        let seconds = (serial * SECONDS_PER_DAY).round() as i64;
        Value::String(format_hms(seconds))
    } else {
        Number::from_f64(serial).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Seconds in an ISO-8601 time duration such as `PT1H02M05S`.
fn iso_duration_seconds(s: &str) -> Option<i64> {
    let body = s.strip_prefix("PT")?;
    let mut total = 0.0;
    let mut number = String::new();

    for c in body.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'H' | 'M' | 'S' => {
                let n: f64 = number.parse().ok()?;
                number.clear();
                total += match c {
                    'H' => n * 3600.0,
                    'M' => n * 60.0,
                    _ => n,
                };
            }
            _ => return None,
        }
    }

    number.is_empty().then(|| total.round() as i64)
}

fn header_text(cell: &Data) -> String {
    match cell_to_value(cell) {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}
