//! Domain model for candidacy reports.
//!
//! Everything here is a transient, read-only projection of the source
//! database plus the derived report layout. No type in this module touches
//! infrastructure.

mod error;
mod ids;
mod period;
mod records;
mod row;
mod schema;
mod target;

pub use error::ReportDomainError;
pub(crate) use ids::raw_ids;
pub use ids::{
    AssessmentId, CandidacyId, CustomFieldId, JobId, OrganizationId, ScoringDimensionId, UserId,
};
pub use period::{DateRange, ReportingPeriod};
pub use records::{
    Assessment, AssessmentResult, CandidacyRecord, ChannelActivity, CustomField,
    CustomFieldAnswer, DimensionRating, JobFilter, JobRef, MessageActivity, MessageChannel,
    ScoringDimension,
};
pub(crate) use row::{cell, text_cell, timestamp_cell};
pub use row::{ReportRow, TIMESTAMP_FORMAT};
pub use schema::{
    AssessmentMetric, ColumnDescriptor, ColumnGroup, ColumnSource, DimensionMetric, FixedColumn,
    NON_PIPELINE_SUFFIX, ReportSchema, SchemaParts, slugify,
};
pub use target::ReportTarget;
