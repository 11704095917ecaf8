//! Transformation module.
//!
//! This module handles spreadsheet rows to statistics document conversion:
//! - Duration: `M:S` / `H:M:S` strings to milliseconds
//! - Row: required-column checks and row to question record mapping
//! - Document: document assembly with identifier policy and clock
//! - Pipeline: parse, build, validate, with log reporting

pub mod document;
pub mod duration;
pub mod pipeline;
pub mod row;

pub use document::{DocumentBuilder, IdPolicy};
pub use duration::parse_duration_ms;
pub use pipeline::*;
pub use row::{map_row, QuestionRow, REQUIRED_COLUMNS};
