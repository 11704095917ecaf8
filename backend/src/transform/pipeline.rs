//! High-level pipeline: spreadsheet in, statistics document out.
//!
//! Combines parsing, document building and schema validation, reporting each
//! step on the log stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use quizstats::{process_file, IdPolicy, ProcessOptions};
//! use std::path::Path;
//!
//! let policy = IdPolicy::supplied("507f1f77bcf86cd799439011")?;
//! let result = process_file(Path::new("stats.xlsx"), policy, ProcessOptions::default())?;
//! println!("Converted {} questions", result.document.questions().len());
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::document::{DocumentBuilder, IdPolicy};
use super::row::REQUIRED_COLUMNS;
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::clock::Clock;
use crate::error::PipelineError;
use crate::identifier::IdentifierService;
use crate::models::StatsDocument;
use crate::parser::{parse_bytes, parse_file, ParseResult, SheetFormat};
use crate::validation::validate_stats_document;

/// Options for the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Skip the schema check on the built document
    pub skip_validation: bool,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// The converted document
    pub document: StatsDocument,
    /// Schema violations found on the document (empty when valid or skipped)
    pub schema_errors: Vec<String>,
    /// Input file information
    pub sheet_info: SheetInfo,
}

/// Input file information
#[derive(Debug, Clone, Serialize)]
pub struct SheetInfo {
    pub format: SheetFormat,
    pub sheet_name: Option<String>,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&ParseResult> for SheetInfo {
    fn from(parsed: &ParseResult) -> Self {
        Self {
            format: parsed.format,
            sheet_name: parsed.sheet_name.clone(),
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.headers.clone(),
            row_count: parsed.records.len(),
        }
    }
}

/// Convert a spreadsheet file on disk.
pub fn process_file(
    path: &Path,
    policy: IdPolicy,
    options: ProcessOptions,
) -> Result<ProcessResult, PipelineError> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_file(path)?;
    process_parsed(parsed, policy, &options)
}

/// Convert uploaded bytes. `file_name` helps format detection.
pub fn process_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    policy: IdPolicy,
    options: ProcessOptions,
) -> Result<ProcessResult, PipelineError> {
    let format = SheetFormat::detect(file_name, bytes);
    log_info(format!(
        "📖 Reading {} ({} bytes, {})...",
        file_name.unwrap_or("upload"),
        bytes.len(),
        format
    ));
    let parsed = parse_bytes(bytes, format)?;
    process_parsed(parsed, policy, &options)
}

/// Convert already-parsed rows with the default builder.
pub fn process_parsed(
    parsed: ParseResult,
    policy: IdPolicy,
    options: &ProcessOptions,
) -> Result<ProcessResult, PipelineError> {
    process_parsed_with(&DocumentBuilder::new(), parsed, policy, options)
}

/// Convert already-parsed rows with a given builder.
pub fn process_parsed_with<I: IdentifierService, C: Clock>(
    builder: &DocumentBuilder<I, C>,
    parsed: ParseResult,
    policy: IdPolicy,
    options: &ProcessOptions,
) -> Result<ProcessResult, PipelineError> {
    let sheet_info = SheetInfo::from(&parsed);
    print_sheet_info(&sheet_info);

    let missing = missing_columns(&sheet_info.headers);
    if !missing.is_empty() && sheet_info.row_count > 0 {
        log_warning(format!("Missing columns: {}", missing.join(", ")));
    }

    log_info("⚙️  Building document...");
    let document = builder.build(&parsed.records, policy).map_err(|e| {
        log_error(e.to_string());
        e
    })?;
    log_success(format!(
        "{} questions, test_id {}",
        document.questions().len(),
        document.test_id()
    ));

    let schema_errors = if options.skip_validation {
        log_info("(validation skipped)");
        Vec::new()
    } else {
        log_info("✔️  Validating document...");
        let errors = match validate_stats_document(&document.to_value()?) {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };
        print_validation_result(&errors);
        errors
    };

    Ok(ProcessResult {
        document,
        schema_errors,
        sheet_info,
    })
}

/// Required columns absent from a header row.
pub fn missing_columns(headers: &[String]) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == col))
        .collect()
}

fn print_sheet_info(info: &SheetInfo) {
    log_success(format!("Format: {}", info.format));
    if let Some(ref sheet) = info.sheet_name {
        log_success(format!("Worksheet: {}", sheet));
    }
    if let Some(ref encoding) = info.encoding {
        log_success(format!("Detected encoding: {}", encoding));
    }
    if let Some(delimiter) = info.delimiter {
        log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    }
    log_success(format!("Read {} rows", info.row_count));

    log_info(format!("📋 {} columns:", info.headers.len()));
    for (i, col) in info.headers.iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }
}

fn print_validation_result(errors: &[String]) {
    if errors.is_empty() {
        log_success("Document matches schema");
    } else {
        log_warning(format!("{} schema violations", errors.len()));
        for err in errors.iter().take(3) {
            log_error(err.clone());
        }
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
