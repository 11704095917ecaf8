//! Spreadsheet rows to question records.
//!
//! A raw row is a JSON object keyed by column header. [`QuestionRow::from_value`]
//! checks the required columns once and keeps typed handles to the cells;
//! [`QuestionRow::into_record`] then only has the time columns left to parse.

use serde_json::Value;

use super::duration::parse_duration_ms;
use crate::error::TransformError;
use crate::models::{QuestionRecord, StatisticsBlock};

pub const QUESTION_ID: &str = "Question ID";
pub const TYPE: &str = "Type";
pub const OVERALL_ATTEMPT: &str = "Overall Attempt";
pub const OVERALL_ACCURACY: &str = "Overall Accuracy";
pub const OVERALL_P_VALUE: &str = "Overall P-Value";
pub const OVERALL_TIME_SPENT: &str = "Overall Time Spent";
pub const TOPPERS_ATTEMPT: &str = "Toppers Attempt";
pub const TOPPERS_ACCURACY: &str = "Toppers Accuracy";
pub const TOPPERS_P_VALUE: &str = "Toppers P-Value";
pub const TOPPERS_TIME_SPENT: &str = "Toppers Time Spent";

/// Every column a row must carry, in spreadsheet order.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    QUESTION_ID,
    TYPE,
    OVERALL_ATTEMPT,
    OVERALL_ACCURACY,
    OVERALL_P_VALUE,
    OVERALL_TIME_SPENT,
    TOPPERS_ATTEMPT,
    TOPPERS_ACCURACY,
    TOPPERS_P_VALUE,
    TOPPERS_TIME_SPENT,
];

/// Raw metrics for one population, before time parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatistics {
    pub attempt: Value,
    pub accuracy: Value,
    pub p_value: Value,
    pub time_spent: String,
}

/// A row whose required columns are known to be present.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRow {
    /// Zero-based position among the data rows.
    pub index: usize,
    pub question_id: String,
    pub question_type: Value,
    pub overall: RawStatistics,
    pub toppers: RawStatistics,
}

impl QuestionRow {
    /// Check required columns and pull them out of a raw row.
    ///
    /// Absent keys and empty cells in the identifier, type and time columns
    /// fail with [`TransformError::MissingField`]. Empty statistics cells are
    /// kept as `null`.
    pub fn from_value(index: usize, row: &Value) -> Result<Self, TransformError> {
        let cells = Cells { index, row };

        Ok(Self {
            index,
            question_id: cells.text(QUESTION_ID)?,
            question_type: cells.non_empty(TYPE)?.clone(),
            overall: RawStatistics {
                attempt: cells.any(OVERALL_ATTEMPT)?.clone(),
                accuracy: cells.any(OVERALL_ACCURACY)?.clone(),
                p_value: cells.any(OVERALL_P_VALUE)?.clone(),
                time_spent: cells.text(OVERALL_TIME_SPENT)?,
            },
            toppers: RawStatistics {
                attempt: cells.any(TOPPERS_ATTEMPT)?.clone(),
                accuracy: cells.any(TOPPERS_ACCURACY)?.clone(),
                p_value: cells.any(TOPPERS_P_VALUE)?.clone(),
                time_spent: cells.text(TOPPERS_TIME_SPENT)?,
            },
        })
    }

    /// Parse both time columns and assemble the record.
    pub fn into_record(self) -> Result<QuestionRecord, TransformError> {
        let index = self.index;
        Ok(QuestionRecord {
            question_id: self.question_id,
            question_type: self.question_type,
            overall_statistics: statistics(index, OVERALL_TIME_SPENT, self.overall)?,
            toppers_statistics: statistics(index, TOPPERS_TIME_SPENT, self.toppers)?,
        })
    }
}

/// Map one raw row straight to a record.
pub fn map_row(index: usize, row: &Value) -> Result<QuestionRecord, TransformError> {
    QuestionRow::from_value(index, row)?.into_record()
}

fn statistics(index: usize, field: &str, raw: RawStatistics) -> Result<StatisticsBlock, TransformError> {
    let average_time_taken =
        parse_duration_ms(&raw.time_spent).map_err(|source| TransformError::InvalidDuration {
            row: index,
            field: field.to_string(),
            value: raw.time_spent.clone(),
            source,
        })?;

    Ok(StatisticsBlock {
        attempt_percentage: raw.attempt,
        accuracy_percentage: raw.accuracy,
        p_value: raw.p_value,
        average_time_taken,
    })
}

/// Column lookups on one raw row.
struct Cells<'a> {
    index: usize,
    row: &'a Value,
}

impl<'a> Cells<'a> {
    fn missing(&self, field: &str) -> TransformError {
        TransformError::MissingField {
            row: self.index,
            field: field.to_string(),
        }
    }

    /// Present, possibly null.
    fn any(&self, field: &str) -> Result<&'a Value, TransformError> {
        self.row.get(field).ok_or_else(|| self.missing(field))
    }

    /// Present and not null or blank.
    fn non_empty(&self, field: &str) -> Result<&'a Value, TransformError> {
        match self.any(field)? {
            Value::Null => Err(self.missing(field)),
            Value::String(s) if s.trim().is_empty() => Err(self.missing(field)),
            value => Ok(value),
        }
    }

    /// Present, non-empty, rendered as text.
    fn text(&self, field: &str) -> Result<String, TransformError> {
        Ok(cell_text(self.non_empty(field)?))
    }
}

/// Text form of a cell. Whole-number floats (workbooks store every number
/// as a float) drop their `.0`; other values use their JSON form.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
