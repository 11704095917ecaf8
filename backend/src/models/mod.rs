//! Domain models for the quiz statistics document.
//!
//! - [`StatsDocument`] - one document per uploaded spreadsheet
//! - [`QuestionRecord`] - one entry per spreadsheet row
//! - [`StatisticsBlock`] - attempt/accuracy/p-value/time metrics
//!
//! Serialization follows MongoDB Extended JSON: identifiers become
//! `{"$oid": ...}` and timestamps `{"$date": ...}`.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::clock::format_timestamp;
use crate::identifier::{serialize_oid, ObjectId};

/// Schema version written to `__v`.
pub const SCHEMA_VERSION: u32 = 0;

// =============================================================================
// Statistics
// =============================================================================

/// Metrics for one population (everyone, or the top performers).
///
/// The first three values are copied from the spreadsheet as they are;
/// a numeric cell stays a number, an empty one becomes `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsBlock {
    pub attempt_percentage: Value,
    pub accuracy_percentage: Value,
    pub p_value: Value,
    /// Milliseconds.
    pub average_time_taken: i64,
}

// =============================================================================
// Question
// =============================================================================

/// One question row, reshaped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRecord {
    #[serde(serialize_with = "serialize_oid")]
    pub question_id: String,
    pub question_type: Value,
    pub overall_statistics: StatisticsBlock,
    pub toppers_statistics: StatisticsBlock,
}

// =============================================================================
// Document
// =============================================================================

/// The converted spreadsheet. Built once by
/// [`DocumentBuilder`](crate::transform::document::DocumentBuilder) and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    test_id: ObjectId,
    #[serde(rename = "__v")]
    version: u32,
    #[serde(serialize_with = "serialize_date")]
    created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_date")]
    updated_at: DateTime<Utc>,
    questions: Vec<QuestionRecord>,
}

impl StatsDocument {
    pub(crate) fn new(
        id: ObjectId,
        test_id: ObjectId,
        timestamp: DateTime<Utc>,
        questions: Vec<QuestionRecord>,
    ) -> Self {
        Self {
            id,
            test_id,
            version: SCHEMA_VERSION,
            created_at: timestamp,
            updated_at: timestamp,
            questions,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn test_id(&self) -> ObjectId {
        self.test_id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    /// Extended JSON value of the document.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Pretty JSON array holding this single document, indented with four
    /// spaces, as consumed by `mongoimport --jsonArray`.
    pub fn to_import_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        [self].serialize(&mut ser)?;
        Ok(out)
    }
}

/// Serialize a timestamp as `{"$date": "<iso>"}`.
fn serialize_date<S: Serializer>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry("$date", &format_timestamp(instant))?;
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> StatsDocument {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let question = QuestionRecord {
            question_id: "65f000000000000000000001".into(),
            question_type: json!("MCQ"),
            overall_statistics: StatisticsBlock {
                attempt_percentage: json!(87.5),
                accuracy_percentage: json!(42),
                p_value: json!(0.31),
                average_time_taken: 90_000,
            },
            toppers_statistics: StatisticsBlock {
                attempt_percentage: json!(100),
                accuracy_percentage: json!(95.2),
                p_value: Value::Null,
                average_time_taken: 65_000,
            },
        };
        StatsDocument::new(
            ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap(),
            ObjectId::parse_str("507f191e810c19729de860ea").unwrap(),
            ts,
            vec![question],
        )
    }

    #[test]
    fn test_extended_json_shape() {
        let value = sample().to_value().unwrap();

        assert_eq!(value["_id"], json!({ "$oid": "507f1f77bcf86cd799439011" }));
        assert_eq!(value["test_id"], json!({ "$oid": "507f191e810c19729de860ea" }));
        assert_eq!(value["__v"], 0);
        assert_eq!(value["created_at"], json!({ "$date": "2024-02-29T12:00:00.000000Z" }));
        assert_eq!(value["created_at"], value["updated_at"]);

        let q = &value["questions"][0];
        assert_eq!(q["question_id"], json!({ "$oid": "65f000000000000000000001" }));
        assert_eq!(q["question_type"], "MCQ");
        assert_eq!(q["overall_statistics"]["attempt_percentage"], 87.5);
        assert_eq!(q["overall_statistics"]["accuracy_percentage"], 42);
        assert_eq!(q["overall_statistics"]["average_time_taken"], 90_000);
        assert!(q["toppers_statistics"]["p_value"].is_null());
    }

    #[test]
    fn test_import_json_is_array_with_four_space_indent() {
        let bytes = sample().to_import_json().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("[\n    {\n        \"_id\""));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["__v"], 0);
    }
}
