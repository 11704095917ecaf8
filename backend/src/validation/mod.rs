//! JSON Schema validation for statistics documents.
//!
//! The schema (Draft 7) is embedded at compile time from
//! `schemas/stats-document.json` and describes the Extended JSON output:
//! `$oid` wrappers for identifiers, `$date` wrappers with microsecond
//! timestamps, and the two statistics blocks per question.
//!
//! # Example
//!
//! ```rust,ignore
//! use quizstats::validation::validate_stats_document;
//!
//! let doc = serde_json::from_str(&std::fs::read_to_string("result.json")?)?;
//! if let Err(errors) = validate_stats_document(&doc) {
//!     eprintln!("{}", errors.join("\n"));
//! }
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static STATS_DOCUMENT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/stats-document.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Yes/no variant of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate one document.
pub fn validate_stats_document(data: &Value) -> Result<(), Vec<String>> {
    validate(&STATS_DOCUMENT_SCHEMA, data)
}

/// Quick check of one document.
pub fn is_valid_stats_document(data: &Value) -> bool {
    is_valid(&STATS_DOCUMENT_SCHEMA, data)
}

/// Validate a file's content: a single document or an array of them.
/// Errors are prefixed with the document position.
pub fn validate_export(data: &Value) -> Result<usize, Vec<String>> {
    let documents: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    let errors: Vec<String> = documents
        .iter()
        .enumerate()
        .filter_map(|(i, doc)| validate_stats_document(doc).err().map(|errs| (i, errs)))
        .flat_map(|(i, errs)| errs.into_iter().map(move |e| format!("document {}: {}", i, e)))
        .collect();

    if errors.is_empty() {
        Ok(documents.len())
    } else {
        Err(errors)
    }
}
