//! Identifier newtypes for the report domain.
//!
//! Source tables use `BIGINT` surrogate keys. Wrapping them keeps a
//! candidacy id from being passed where an assessment id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database key.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database key.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id! {
    /// Identifier of a row in `e_jobs`.
    JobId
}

integer_id! {
    /// Identifier of the organization owning a job.
    OrganizationId
}

integer_id! {
    /// Identifier of a row in `e_candidacies`.
    CandidacyId
}

integer_id! {
    /// Identifier of a row in `e_users`.
    UserId
}

integer_id! {
    /// Identifier of a row in `e_assessments`.
    AssessmentId
}

integer_id! {
    /// Identifier of a row in `e_scoring_dimensions`.
    ScoringDimensionId
}

integer_id! {
    /// Identifier of a row in `e_custom_fields`.
    CustomFieldId
}

/// Collects raw keys for binding as a `BIGINT[]` query parameter.
pub(crate) fn raw_ids<I, T>(ids: I) -> Vec<i64>
where
    I: IntoIterator<Item = T>,
    T: Into<i64>,
{
    ids.into_iter().map(Into::into).collect()
}

macro_rules! into_raw {
    ($($name:ident),*) => {
        $(
            impl From<$name> for i64 {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )*
    };
}

into_raw!(
    JobId,
    OrganizationId,
    CandidacyId,
    UserId,
    AssessmentId,
    ScoringDimensionId,
    CustomFieldId
);
