//! Error types for report domain construction.

use super::{JobId, OrganizationId};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors returned while building report domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportDomainError {
    /// A date range has no instants in it.
    #[error("date range [{start}, {end}) is empty")]
    EmptyDateRange {
        /// Requested lower bound.
        start: NaiveDateTime,
        /// Requested upper bound.
        end: NaiveDateTime,
    },

    /// A report target was created without jobs.
    #[error("a report target needs at least one job")]
    EmptyTarget,

    /// The jobs of one report target belong to different organizations.
    #[error("jobs {jobs:?} span several organizations: {organizations:?}")]
    MixedOrganizations {
        /// Jobs of the target.
        jobs: Vec<JobId>,
        /// Distinct organizations found.
        organizations: Vec<OrganizationId>,
    },

    /// A custom field would produce a column name already in use.
    #[error("custom field column '{column}' collides with an existing column")]
    ColumnCollision {
        /// Offending column name.
        column: String,
    },
}
