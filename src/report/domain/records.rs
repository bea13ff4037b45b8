//! Read-only projections of the source tables.
//!
//! These carry only what a report needs: ids, names and the candidacy
//! fields rendered into fixed columns.

use super::{
    AssessmentId, CandidacyId, CustomFieldId, DateRange, JobId, OrganizationId,
    ScoringDimensionId, UserId,
};
use chrono::NaiveDateTime;
use serde::Serialize;

/// A job as known to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRef {
    /// Job identifier.
    pub id: JobId,
    /// Display name, written into every row of the job's report.
    pub name: String,
    /// Organization owning the job.
    pub organization_id: OrganizationId,
}

impl JobRef {
    /// Creates a job reference.
    #[must_use]
    pub fn new(id: JobId, name: impl Into<String>, organization_id: OrganizationId) -> Self {
        Self {
            id,
            name: name.into(),
            organization_id,
        }
    }
}

/// Criteria for selecting the jobs an orchestrator run covers.
///
/// Every criterion is optional; an empty filter selects all jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    /// Restrict to jobs owned by this organization.
    pub organization_id: Option<OrganizationId>,
    /// Restrict to these job ids.
    pub job_ids: Vec<JobId>,
    /// Candidacy creation range of the reports. When no job ids are given,
    /// discovery also skips jobs without a candidacy created in this range;
    /// explicitly requested jobs are always listed.
    pub candidacies_created: Option<DateRange>,
}

/// An assessment column group source: id and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// Assessment identifier.
    pub id: AssessmentId,
    /// Display name used to derive column names.
    pub name: String,
}

impl Assessment {
    /// Creates an assessment projection.
    #[must_use]
    pub fn new(id: AssessmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A scoring dimension: a named sub-score of one or more assessments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringDimension {
    /// Dimension identifier.
    pub id: ScoringDimensionId,
    /// Display name used to derive column names.
    pub name: String,
}

impl ScoringDimension {
    /// Creates a scoring dimension projection.
    #[must_use]
    pub fn new(id: ScoringDimensionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// An organization-defined custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomField {
    /// Field identifier.
    pub id: CustomFieldId,
    /// Raw field name, used verbatim (trimmed) as the column header.
    pub name: String,
}

impl CustomField {
    /// Creates a custom field projection.
    #[must_use]
    pub fn new(id: CustomFieldId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One candidacy joined with its user and pipeline stage.
///
/// Loaded once per report; fixed columns are rendered from it without any
/// further query.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidacyRecord {
    /// Candidacy identifier.
    pub id: CandidacyId,
    /// Applicant.
    pub user_id: UserId,
    /// Job applied to.
    pub job_id: JobId,
    /// Creation timestamp; also drives report row order.
    pub created_at: NaiveDateTime,
    /// Candidacy status label.
    pub status: Option<String>,
    /// Whether the candidacy failed the pipeline.
    pub failed: Option<bool>,
    /// Raw score.
    pub score: Option<f64>,
    /// Overall percentile.
    pub percentile: Option<f64>,
    /// Weighted percentage score.
    pub weighted_percentage_score: Option<f64>,
    /// Assessments still to be taken.
    pub remaining_assessment_count: Option<i64>,
    /// Pipeline stage name.
    pub pipeline_stage: Option<String>,
    /// Applicant email.
    pub email: Option<String>,
    /// Applicant first name.
    pub first_name: Option<String>,
    /// Applicant last name.
    pub last_name: Option<String>,
    /// Applicant phone country code.
    pub country_code: Option<String>,
    /// Applicant phone number.
    pub phone: Option<String>,
}

impl CandidacyRecord {
    /// Creates a record with only the keys and creation time set.
    #[must_use]
    pub const fn new(
        id: CandidacyId,
        user_id: UserId,
        job_id: JobId,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            user_id,
            job_id,
            created_at,
            status: None,
            failed: None,
            score: None,
            percentile: None,
            weighted_percentage_score: None,
            remaining_assessment_count: None,
            pipeline_stage: None,
            email: None,
            first_name: None,
            last_name: None,
            country_code: None,
            phone: None,
        }
    }

    /// Sets the overall percentile.
    #[must_use]
    pub const fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = Some(percentile);
        self
    }

    /// Sets the raw score.
    #[must_use]
    pub const fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Sets the pipeline stage name.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.pipeline_stage = Some(stage.into());
        self
    }

    /// Sets the applicant's name and email.
    #[must_use]
    pub fn with_applicant(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self.email = Some(email.into());
        self
    }
}

/// A user's result for one assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentResult {
    /// Assessment the result belongs to.
    pub assessment_id: AssessmentId,
    /// Percentage score for this assessment.
    pub percentage_score: Option<f64>,
    /// When the user started.
    pub started_at: Option<NaiveDateTime>,
    /// When the user completed.
    pub completed_at: Option<NaiveDateTime>,
}

/// A candidacy's rating on one scoring dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionRating {
    /// Rated dimension.
    pub scoring_dimension_id: ScoringDimensionId,
    /// Percentage score for the dimension.
    pub percentage_score: Option<f64>,
}

/// A non-empty answer to a question linked to a custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldAnswer {
    /// Field the answered question is linked to.
    pub custom_field_id: CustomFieldId,
    /// Free-text answer.
    pub value: String,
}

/// Messaging channels counted per candidacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageChannel {
    /// Email events.
    Email,
    /// SMS events.
    Sms,
}

impl MessageChannel {
    /// Every counted channel, in column order.
    pub const ALL: [Self; 2] = [Self::Email, Self::Sms];

    /// Value of `e_events.type` for this channel.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }

    /// Parses an `e_events.type` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            _ => None,
        }
    }
}

/// Event count and first event time for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelActivity {
    /// Number of events.
    pub count: i64,
    /// Creation time of the lowest-id event.
    pub first_created_at: Option<NaiveDateTime>,
}

/// Messaging activity for a candidacy across all channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageActivity {
    /// Email activity.
    pub email: ChannelActivity,
    /// SMS activity.
    pub sms: ChannelActivity,
}

impl MessageActivity {
    /// Records the activity of one channel.
    pub const fn set(&mut self, channel: MessageChannel, activity: ChannelActivity) {
        match channel {
            MessageChannel::Email => self.email = activity,
            MessageChannel::Sms => self.sms = activity,
        }
    }
}
