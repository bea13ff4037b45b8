//! Assembled report rows and cell rendering.

use super::CandidacyId;
use chrono::NaiveDateTime;
use std::fmt::Display;

/// Timestamp layout used for every date column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One candidacy's values, aligned with its report schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    candidacy_id: CandidacyId,
    values: Vec<String>,
}

impl ReportRow {
    /// Creates a row.
    #[must_use]
    pub const fn new(candidacy_id: CandidacyId, values: Vec<String>) -> Self {
        Self {
            candidacy_id,
            values,
        }
    }

    /// Candidacy the row describes.
    #[must_use]
    pub const fn candidacy_id(&self) -> CandidacyId {
        self.candidacy_id
    }

    /// Cell values in column order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cell at a position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&str> {
        self.values.get(position).map(String::as_str)
    }
}

/// Renders an optional displayable value; missing values become `""`.
pub(crate) fn cell<T: Display>(value: Option<T>) -> String {
    value.map(|inner| inner.to_string()).unwrap_or_default()
}

/// Renders an optional timestamp.
pub(crate) fn timestamp_cell(value: Option<NaiveDateTime>) -> String {
    value
        .map(|instant| instant.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Renders optional text.
pub(crate) fn text_cell(value: Option<&str>) -> String {
    value.map(str::to_owned).unwrap_or_default()
}
