//! Error types for the quiz statistics pipeline.
//!
//! - [`SheetError`] - reading the uploaded spreadsheet into rows
//! - [`IdentifierError`] - malformed `test_id`
//! - [`FormatError`] - malformed time-duration strings
//! - [`TransformError`] - row-to-record mapping failures
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors, mapped to status codes
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::api::types::error_response;

// =============================================================================
// Row Source Errors
// =============================================================================

/// Errors while turning an uploaded file into rows.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook container could not be opened or a sheet could not be read.
    #[error("Invalid workbook: {0}")]
    Workbook(String),

    /// The workbook has no worksheet.
    #[error("Workbook has no worksheet")]
    NoSheets,

    /// Invalid CSV content.
    #[error("Invalid CSV format: {0}")]
    Csv(String),

    /// Could not decode the file content.
    #[error("Failed to decode content as {encoding}: {message}")]
    Encoding { encoding: String, message: String },

    /// Empty file.
    #[error("Spreadsheet is empty")]
    EmptyFile,

    /// No header row found.
    #[error("No header row found")]
    NoHeaders,
}

impl From<calamine::Error> for SheetError {
    fn from(err: calamine::Error) -> Self {
        SheetError::Workbook(err.to_string())
    }
}

impl From<csv::Error> for SheetError {
    fn from(err: csv::Error) -> Self {
        SheetError::Csv(err.to_string())
    }
}

// =============================================================================
// Identifier Errors
// =============================================================================

/// A supplied identifier is not 24 hexadecimal characters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid test_id format. Must be 24-character hex.")]
pub struct IdentifierError {
    /// The rejected input, verbatim.
    pub value: String,
}

// =============================================================================
// Duration Errors
// =============================================================================

/// A time-duration string that is not `M:S` or `H:M:S`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid time format: {0}")]
pub struct FormatError(pub String);

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors while mapping rows to question records.
///
/// `row` is the zero-based position of the row among the data rows.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Required column absent (or empty) in a row.
    #[error("Missing field '{field}' in row {row}")]
    MissingField { row: usize, field: String },

    /// A time column could not be parsed.
    #[error("Invalid duration in row {row}, field '{field}' (value '{value}'): {source}")]
    InvalidDuration {
        row: usize,
        field: String,
        value: String,
        #[source]
        source: FormatError,
    },
}

impl TransformError {
    /// Name of the column the error refers to.
    pub fn field(&self) -> &str {
        match self {
            TransformError::MissingField { field, .. } => field,
            TransformError::InvalidDuration { field, .. } => field,
        }
    }

    /// Zero-based row position the error refers to.
    pub fn row(&self) -> usize {
        match self {
            TransformError::MissingField { row, .. } => *row,
            TransformError::InvalidDuration { row, .. } => *row,
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::process_file`]
/// and friends. It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Spreadsheet could not be read.
    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] SheetError),

    /// Supplied identifier is malformed.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// A row could not be converted.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Writing or reading a scratch file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error, reported as a processing failure.
    #[error("Processing error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Malformed `test_id` form field.
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    /// A required multipart field was not sent.
    #[error("Missing form field: {0}")]
    MissingFormField(String),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload exceeds the configured body limit.
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidIdentifier(_) | ServerError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::MissingFormField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Pipeline(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for row source operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
