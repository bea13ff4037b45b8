//! Read port over the candidacy database.

use crate::report::domain::{
    Assessment, AssessmentId, AssessmentResult, CandidacyId, CandidacyRecord, CustomField,
    CustomFieldAnswer, CustomFieldId, DateRange, DimensionRating, JobFilter, JobId, JobRef,
    MessageActivity, OrganizationId, ScoringDimension, ScoringDimensionId, UserId,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use thiserror::Error;

/// Result type for report source lookups.
pub type SourceResult<T> = Result<T, SourceError>;

/// Read-only lookups a report is compiled from.
///
/// Every method is a single round trip. Id collections are passed as
/// slices and must be bound as query parameters by implementations.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Lists jobs matching `filter`, ordered by id.
    ///
    /// The candidacy range only narrows discovery: when `filter.job_ids` is
    /// non-empty every existing requested job is returned.
    async fn list_jobs(&self, filter: &JobFilter) -> SourceResult<Vec<JobRef>>;

    /// Returns the distinct organizations owning `jobs`, ordered by id.
    async fn organizations_of(&self, jobs: &[JobId]) -> SourceResult<Vec<OrganizationId>>;

    /// Returns an organization's custom fields ordered by id.
    async fn custom_fields(&self, organization: OrganizationId)
    -> SourceResult<Vec<CustomField>>;

    /// Returns the assessments attached to `jobs`, ordered by association
    /// sequence. The same assessment may appear more than once.
    async fn pipeline_assessments(&self, jobs: &[JobId]) -> SourceResult<Vec<Assessment>>;

    /// Returns the candidacies of `jobs` joined with user and pipeline
    /// stage, ordered by creation time then id.
    async fn candidacies(
        &self,
        jobs: &[JobId],
        created: Option<DateRange>,
    ) -> SourceResult<Vec<CandidacyRecord>>;

    /// Returns the distinct assessments the users of `candidacies` have
    /// results for, ordered by id.
    async fn assessments_taken(
        &self,
        candidacies: &[CandidacyId],
    ) -> SourceResult<Vec<Assessment>>;

    /// Returns the distinct scoring dimension ids reachable from
    /// `assessments` through their steps and scoring rules, ordered by id.
    async fn dimension_ids_of(
        &self,
        assessments: &[AssessmentId],
    ) -> SourceResult<Vec<ScoringDimensionId>>;

    /// Returns scoring dimension rows ordered by id.
    async fn scoring_dimensions(
        &self,
        ids: &[ScoringDimensionId],
    ) -> SourceResult<Vec<ScoringDimension>>;

    /// Returns a candidacy's tag names ordered by name.
    async fn tag_names(&self, candidacy: CandidacyId) -> SourceResult<Vec<String>>;

    /// Counts a user's assessment results with a completion time.
    async fn completed_assessment_count(&self, user: UserId) -> SourceResult<i64>;

    /// Returns email and SMS event counts and first event times.
    async fn message_activity(&self, candidacy: CandidacyId) -> SourceResult<MessageActivity>;

    /// Returns the start of the candidacy's earliest calendar event.
    async fn first_calendar_event(
        &self,
        candidacy: CandidacyId,
    ) -> SourceResult<Option<NaiveDateTime>>;

    /// Returns a user's results for `assessments`, ordered by result id.
    async fn assessment_results(
        &self,
        user: UserId,
        assessments: &[AssessmentId],
    ) -> SourceResult<Vec<AssessmentResult>>;

    /// Returns a candidacy's ratings on `dimensions`, ordered by rating id.
    async fn dimension_ratings(
        &self,
        candidacy: CandidacyId,
        dimensions: &[ScoringDimensionId],
    ) -> SourceResult<Vec<DimensionRating>>;

    /// Returns the candidacy's non-empty answers to questions linked to
    /// `fields`, ordered by answer id.
    async fn custom_field_answers(
        &self,
        candidacy: CandidacyId,
        fields: &[CustomFieldId],
    ) -> SourceResult<Vec<CustomFieldAnswer>>;
}

/// Errors returned by report source implementations.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// No connection could be acquired within the pool's bound.
    #[error("connection pool exhausted: {0}")]
    ConnectionExhausted(Arc<dyn std::error::Error + Send + Sync>),

    /// A query failed or timed out.
    #[error("query failed: {0}")]
    QueryFailed(Arc<dyn std::error::Error + Send + Sync>),
}

impl SourceError {
    /// Wraps a connection acquisition error.
    #[must_use]
    pub fn exhausted(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ConnectionExhausted(Arc::new(err))
    }

    /// Wraps a query error.
    #[must_use]
    pub fn query(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::QueryFailed(Arc::new(err))
    }

    /// Whether the error should abort the whole report rather than one row.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionExhausted(_))
    }
}
