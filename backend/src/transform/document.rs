//! Assemble a [`StatsDocument`] from spreadsheet rows.
//!
//! ```text
//! rows ──▶ QuestionRow (required columns) ──▶ QuestionRecord (times parsed)
//!                                                    │
//! IdPolicy ──▶ test_id      IdentifierService ──▶ _id │   Clock ──▶ created_at = updated_at
//!                                                    ▼
//!                                              StatsDocument
//! ```
//!
//! The builder holds no per-call state and can be shared across requests.

use serde_json::Value;

use super::row::map_row;
use crate::clock::{Clock, SystemClock};
use crate::error::{IdentifierError, TransformError};
use crate::identifier::{IdentifierService, ObjectId, ObjectIdGenerator};
use crate::models::{QuestionRecord, StatsDocument};

/// Where the document's `test_id` comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Generate a fresh identifier.
    Generate,
    /// Use a caller-supplied, already validated identifier.
    UseSupplied(ObjectId),
}

impl IdPolicy {
    /// Validate a caller-supplied `test_id`. The value must be exactly 24
    /// hex characters; surrounding whitespace is rejected.
    pub fn supplied(test_id: &str) -> Result<Self, IdentifierError> {
        Self::supplied_with(&ObjectIdGenerator, test_id)
    }

    /// Validate a caller-supplied `test_id` through a given identifier service.
    pub fn supplied_with<I: IdentifierService>(ids: &I, test_id: &str) -> Result<Self, IdentifierError> {
        ids.validate(test_id).map(IdPolicy::UseSupplied)
    }
}

/// Builds documents using an identifier source and a clock.
pub struct DocumentBuilder<I = ObjectIdGenerator, C = SystemClock> {
    ids: I,
    clock: C,
}

impl DocumentBuilder {
    /// Builder with the default generator and the system clock.
    pub fn new() -> Self {
        Self::with_parts(ObjectIdGenerator, SystemClock)
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: IdentifierService, C: Clock> DocumentBuilder<I, C> {
    pub fn with_parts(ids: I, clock: C) -> Self {
        Self { ids, clock }
    }

    /// Build one document. The first failing row aborts the build.
    pub fn build(&self, rows: &[Value], policy: IdPolicy) -> Result<StatsDocument, TransformError> {
        let id = self.ids.generate();
        let test_id = match policy {
            IdPolicy::Generate => self.ids.generate(),
            IdPolicy::UseSupplied(test_id) => test_id,
        };
        let timestamp = self.clock.now();

        let questions = rows
            .iter()
            .enumerate()
            .map(|(i, row)| map_row(i, row))
            .collect::<Result<Vec<QuestionRecord>, _>>()?;

        Ok(StatsDocument::new(id, test_id, timestamp, questions))
    }
}
