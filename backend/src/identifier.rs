//! 24-hex-character document identifiers.
//!
//! [`ObjectId`] is the BSON object id used for `_id`, `test_id` and friends.
//! It serializes as Extended JSON (`{"$oid": "<hex>"}`), so the generated
//! documents import cleanly into a MongoDB collection.

use serde::Serializer;

use crate::error::IdentifierError;

pub use bson::oid::ObjectId;

/// Length of the hexadecimal form.
pub const OBJECT_ID_HEX_LEN: usize = 24;

/// Parse the 24-character hexadecimal form (either case).
pub fn parse_object_id(value: &str) -> Result<ObjectId, IdentifierError> {
    ObjectId::parse_str(value).map_err(|_| IdentifierError {
        value: value.to_string(),
    })
}

/// Serialize any identifier string as `{"$oid": "<value>"}`.
///
/// Question ids come from the spreadsheet and are not checked, so they are
/// kept as text rather than parsed into an [`ObjectId`].
pub fn serialize_oid<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry("$oid", value)?;
    map.end()
}

// =============================================================================
// Identifier service
// =============================================================================

/// Source of identifiers for the document builder.
pub trait IdentifierService: Send + Sync {
    /// A fresh, well-formed identifier.
    fn generate(&self) -> ObjectId;

    /// Check that `value` is a well-formed identifier.
    fn validate(&self, value: &str) -> Result<ObjectId, IdentifierError> {
        parse_object_id(value)
    }
}

/// Default generator: timestamp, per-process random value and counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdGenerator;

impl IdentifierService for ObjectIdGenerator {
    fn generate(&self) -> ObjectId {
        ObjectId::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_valid() {
        let id = parse_object_id("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(id.to_hex(), "507f1f77bcf86cd799439011");
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn test_parse_uppercase_normalizes() {
        let id = parse_object_id("507F1F77BCF86CD799439011").unwrap();
        assert_eq!(id.to_hex(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in [
            "not-24-hex",
            "",
            "507f1f77bcf86cd79943901",
            "507f1f77bcf86cd7994390111",
            "zzzzzzzzzzzzzzzzzzzzzzzz",
        ] {
            let err = parse_object_id(bad).unwrap_err();
            assert_eq!(err.value, bad);
        }
    }

    #[test]
    fn test_generated_ids_are_distinct_and_well_formed() {
        let generator = ObjectIdGenerator;
        let ids: HashSet<ObjectId> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 1000);

        for id in &ids {
            let hex = id.to_hex();
            assert_eq!(hex.len(), OBJECT_ID_HEX_LEN);
            assert!(generator.validate(&hex).is_ok());
        }
    }

    #[test]
    fn test_generated_timestamp_is_recent() {
        let id = ObjectIdGenerator.generate();
        let now = chrono::Utc::now().timestamp_millis();
        assert!((now - id.timestamp().timestamp_millis()).abs() <= 5_000);
    }

    #[test]
    fn test_serializes_as_extended_json() {
        let id = parse_object_id("507f1f77bcf86cd799439011").unwrap();
        let value = serde_json::to_value(id).unwrap();
        assert_eq!(value, serde_json::json!({ "$oid": "507f1f77bcf86cd799439011" }));
    }

    #[test]
    fn test_question_ids_serialize_verbatim() {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(serialize_with = "serialize_oid")]
            id: String,
        }

        let value = serde_json::to_value(Wrapper { id: "Q-17".into() }).unwrap();
        assert_eq!(value, serde_json::json!({ "id": { "$oid": "Q-17" } }));
    }
}
