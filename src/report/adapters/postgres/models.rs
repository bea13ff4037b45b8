//! Diesel row models for report lookups.

use chrono::NaiveDateTime;
use diesel::QueryableByName;
use diesel::sql_types::{BigInt, Bool, Double, Nullable, Text, Timestamp};

use crate::report::domain::{
    Assessment, AssessmentId, AssessmentResult, CandidacyId, CandidacyRecord, CustomField,
    CustomFieldAnswer, CustomFieldId, DimensionRating, JobId, JobRef, OrganizationId,
    ScoringDimension, ScoringDimensionId, UserId,
};

/// A job with its organization.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct JobRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = BigInt)]
    pub organization_id: i64,
}

impl From<JobRow> for JobRef {
    fn from(row: JobRow) -> Self {
        Self::new(
            JobId::new(row.id),
            row.name,
            OrganizationId::new(row.organization_id),
        )
    }
}

/// A bare id column.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub(super) struct IdRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
}

/// An id with a display name.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct NamedRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub name: String,
}

impl From<NamedRow> for Assessment {
    fn from(row: NamedRow) -> Self {
        Self::new(AssessmentId::new(row.id), row.name)
    }
}

impl From<NamedRow> for ScoringDimension {
    fn from(row: NamedRow) -> Self {
        Self::new(ScoringDimensionId::new(row.id), row.name)
    }
}

impl From<NamedRow> for CustomField {
    fn from(row: NamedRow) -> Self {
        Self::new(CustomFieldId::new(row.id), row.name)
    }
}

/// A candidacy joined with its user and pipeline stage.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct CandidacyRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = BigInt)]
    pub user_id: i64,
    #[diesel(sql_type = BigInt)]
    pub job_id: i64,
    #[diesel(sql_type = Timestamp)]
    pub created_at: NaiveDateTime,
    #[diesel(sql_type = Nullable<Text>)]
    pub status: Option<String>,
    #[diesel(sql_type = Nullable<Bool>)]
    pub failed: Option<bool>,
    #[diesel(sql_type = Nullable<Double>)]
    pub score: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub percentile: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub weighted_percentage_score: Option<f64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    pub remaining_assessment_count: Option<i64>,
    #[diesel(sql_type = Nullable<Text>)]
    pub pipeline_stage: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub email: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub first_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub last_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub country_code: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub phone: Option<String>,
}

impl From<CandidacyRow> for CandidacyRecord {
    fn from(row: CandidacyRow) -> Self {
        let CandidacyRow {
            id,
            user_id,
            job_id,
            created_at,
            status,
            failed,
            score,
            percentile,
            weighted_percentage_score,
            remaining_assessment_count,
            pipeline_stage,
            email,
            first_name,
            last_name,
            country_code,
            phone,
        } = row;
        Self {
            id: CandidacyId::new(id),
            user_id: UserId::new(user_id),
            job_id: JobId::new(job_id),
            created_at,
            status,
            failed,
            score,
            percentile,
            weighted_percentage_score,
            remaining_assessment_count,
            pipeline_stage,
            email,
            first_name,
            last_name,
            country_code,
            phone,
        }
    }
}

/// A tag name.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct TagRow {
    #[diesel(sql_type = Text)]
    pub name: String,
}

/// A single count.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub(super) struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

/// Event count and first event time for one channel.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct ChannelRow {
    #[diesel(sql_type = Text)]
    pub channel: String,
    #[diesel(sql_type = BigInt)]
    pub event_count: i64,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub first_created_at: Option<NaiveDateTime>,
}

/// Earliest calendar event start.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub(super) struct CalendarRow {
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub first_start: Option<NaiveDateTime>,
}

/// A user's result on one assessment.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct AssessmentResultRow {
    #[diesel(sql_type = BigInt)]
    pub assessment_id: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub percentage_score: Option<f64>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub started_at: Option<NaiveDateTime>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub completed_at: Option<NaiveDateTime>,
}

impl From<AssessmentResultRow> for AssessmentResult {
    fn from(row: AssessmentResultRow) -> Self {
        Self {
            assessment_id: AssessmentId::new(row.assessment_id),
            percentage_score: row.percentage_score,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

/// A candidacy's rating on one dimension.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct RatingRow {
    #[diesel(sql_type = BigInt)]
    pub scoring_dimension_id: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub percentage_score: Option<f64>,
}

impl From<RatingRow> for DimensionRating {
    fn from(row: RatingRow) -> Self {
        Self {
            scoring_dimension_id: ScoringDimensionId::new(row.scoring_dimension_id),
            percentage_score: row.percentage_score,
        }
    }
}

/// An answer linked to a custom field.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct AnswerRow {
    #[diesel(sql_type = BigInt)]
    pub custom_field_id: i64,
    #[diesel(sql_type = Text)]
    pub value: String,
}

impl From<AnswerRow> for CustomFieldAnswer {
    fn from(row: AnswerRow) -> Self {
        Self {
            custom_field_id: CustomFieldId::new(row.custom_field_id),
            value: row.value,
        }
    }
}
