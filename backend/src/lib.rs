//! # Quizstats - quiz statistics spreadsheets to import documents
//!
//! Quizstats turns a per-question statistics export (xlsx, xls, ods or CSV)
//! into a single statistics document, shaped for a document-store import
//! (MongoDB Extended JSON: `$oid` and `$date` wrappers).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Spreadsheet │────▶│   Parser    │────▶│  Transform  │────▶│  Document   │
//! │ (xlsx/csv)  │     │ (rows+types)│     │ (rows, ids) │     │ (ext. JSON) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quizstats::{process_file, IdPolicy, ProcessOptions};
//!
//! let policy = IdPolicy::supplied("507f1f77bcf86cd799439011")?;
//! let result = process_file("stats.xlsx".as_ref(), policy, ProcessOptions::default())?;
//! println!("{}", String::from_utf8(result.document.to_import_json()?)?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Environment configuration
//! - [`clock`] - Time source for document timestamps
//! - [`identifier`] - BSON object identifiers
//! - [`models`] - Statistics document model
//! - [`parser`] - Spreadsheet parsing with format detection
//! - [`transform`] - Duration parsing, row mapping, document assembly, pipeline
//! - [`validation`] - Document schema validation
//! - [`api`] - HTTP API server

// Core modules
pub mod clock;
pub mod config;
pub mod error;
pub mod identifier;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    FormatError, IdentifierError, PipelineError, ServerError, SheetError, TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use identifier::{parse_object_id, IdentifierService, ObjectId, ObjectIdGenerator};
pub use models::{QuestionRecord, StatisticsBlock, StatsDocument};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_file, ParseResult,
    SheetFormat,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{map_row, parse_duration_ms, DocumentBuilder, IdPolicy, REQUIRED_COLUMNS};

pub use transform::pipeline::{
    process_bytes, process_file, process_parsed, ProcessOptions, ProcessResult, SheetInfo,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid_stats_document, validate_export, validate_stats_document};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
