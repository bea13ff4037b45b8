//! `PostgreSQL` implementation of the report source port.

use super::{
    executor::QueryExecutor,
    models::{
        AnswerRow, AssessmentResultRow, CalendarRow, CandidacyRow, ChannelRow, CountRow, IdRow,
        JobRow, NamedRow, RatingRow, TagRow,
    },
    pool::{PoolSettings, ReportPgPool, build_pool},
    queries,
};
use crate::report::{
    domain::{
        Assessment, AssessmentId, AssessmentResult, CandidacyId, CandidacyRecord, ChannelActivity,
        CustomField, CustomFieldAnswer, CustomFieldId, DateRange, DimensionRating, JobFilter,
        JobId, JobRef, MessageActivity, MessageChannel, OrganizationId, ScoringDimension,
        ScoringDimensionId, UserId, raw_ids,
    },
    ports::{ReportSource, SourceError, SourceResult},
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Nullable, Text, Timestamp};

/// `PostgreSQL`-backed report source.
///
/// Every lookup acquires its own pooled connection and releases it before
/// returning, so concurrent row tasks never share a connection.
#[derive(Debug, Clone)]
pub struct PostgresReportSource {
    executor: QueryExecutor,
}

impl PostgresReportSource {
    /// Creates a source over an existing pool.
    #[must_use]
    pub fn new(pool: ReportPgPool, settings: &PoolSettings) -> Self {
        Self {
            executor: QueryExecutor::new(pool, settings.statement_timeout),
        }
    }

    /// Builds a pool from `settings` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ConnectionExhausted`] when the pool's initial
    /// connections cannot be opened.
    pub fn connect(settings: &PoolSettings) -> SourceResult<Self> {
        let pool = build_pool(settings).map_err(SourceError::exhausted)?;
        Ok(Self::new(pool, settings))
    }

    /// Returns the query executor.
    #[must_use]
    pub const fn executor(&self) -> &QueryExecutor {
        &self.executor
    }
}

fn range_bounds(range: Option<DateRange>) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    range.map_or((None, None), |bounds| (Some(bounds.start()), Some(bounds.end())))
}

fn named<T: From<NamedRow>>(rows: Vec<NamedRow>) -> Vec<T> {
    rows.into_iter().map(T::from).collect()
}

#[async_trait]
impl ReportSource for PostgresReportSource {
    async fn list_jobs(&self, filter: &JobFilter) -> SourceResult<Vec<JobRef>> {
        let organization = filter.organization_id.map(OrganizationId::into_inner);
        let job_ids = raw_ids(filter.job_ids.iter().copied());
        let (start, end) = range_bounds(filter.candidacies_created);
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::LIST_JOBS)
                    .bind::<Nullable<BigInt>, _>(organization)
                    .bind::<Array<BigInt>, _>(job_ids)
                    .bind::<Nullable<Timestamp>, _>(start)
                    .bind::<Nullable<Timestamp>, _>(end)
                    .load::<JobRow>(connection)
            })
            .await?;
        Ok(rows.into_iter().map(JobRef::from).collect())
    }

    async fn organizations_of(&self, jobs: &[JobId]) -> SourceResult<Vec<OrganizationId>> {
        let job_ids = raw_ids(jobs.iter().copied());
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::ORGANIZATIONS_OF_JOBS)
                    .bind::<Array<BigInt>, _>(job_ids)
                    .load::<IdRow>(connection)
            })
            .await?;
        Ok(rows.into_iter().map(|row| OrganizationId::new(row.id)).collect())
    }

    async fn custom_fields(
        &self,
        organization: OrganizationId,
    ) -> SourceResult<Vec<CustomField>> {
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::CUSTOM_FIELDS)
                    .bind::<BigInt, _>(organization.into_inner())
                    .load::<NamedRow>(connection)
            })
            .await?;
        Ok(named(rows))
    }

    async fn pipeline_assessments(&self, jobs: &[JobId]) -> SourceResult<Vec<Assessment>> {
        let job_ids = raw_ids(jobs.iter().copied());
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::PIPELINE_ASSESSMENTS)
                    .bind::<Array<BigInt>, _>(job_ids)
                    .load::<NamedRow>(connection)
            })
            .await?;
        Ok(named(rows))
    }

    async fn candidacies(
        &self,
        jobs: &[JobId],
        created: Option<DateRange>,
    ) -> SourceResult<Vec<CandidacyRecord>> {
        let job_ids = raw_ids(jobs.iter().copied());
        let (start, end) = range_bounds(created);
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::CANDIDACIES)
                    .bind::<Array<BigInt>, _>(job_ids)
                    .bind::<Nullable<Timestamp>, _>(start)
                    .bind::<Nullable<Timestamp>, _>(end)
                    .load::<CandidacyRow>(connection)
            })
            .await?;
        Ok(rows.into_iter().map(CandidacyRecord::from).collect())
    }

    async fn assessments_taken(
        &self,
        candidacies: &[CandidacyId],
    ) -> SourceResult<Vec<Assessment>> {
        if candidacies.is_empty() {
            return Ok(Vec::new());
        }
        let candidacy_ids = raw_ids(candidacies.iter().copied());
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::ASSESSMENTS_TAKEN)
                    .bind::<Array<BigInt>, _>(candidacy_ids)
                    .load::<NamedRow>(connection)
            })
            .await?;
        Ok(named(rows))
    }

    async fn dimension_ids_of(
        &self,
        assessments: &[AssessmentId],
    ) -> SourceResult<Vec<ScoringDimensionId>> {
        if assessments.is_empty() {
            return Ok(Vec::new());
        }
        let assessment_ids = raw_ids(assessments.iter().copied());
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::DIMENSION_IDS_OF_ASSESSMENTS)
                    .bind::<Array<BigInt>, _>(assessment_ids)
                    .load::<IdRow>(connection)
            })
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| ScoringDimensionId::new(row.id))
            .collect())
    }

    async fn scoring_dimensions(
        &self,
        ids: &[ScoringDimensionId],
    ) -> SourceResult<Vec<ScoringDimension>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let dimension_ids = raw_ids(ids.iter().copied());
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::SCORING_DIMENSIONS)
                    .bind::<Array<BigInt>, _>(dimension_ids)
                    .load::<NamedRow>(connection)
            })
            .await?;
        Ok(named(rows))
    }

    async fn tag_names(&self, candidacy: CandidacyId) -> SourceResult<Vec<String>> {
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::TAG_NAMES)
                    .bind::<BigInt, _>(candidacy.into_inner())
                    .load::<TagRow>(connection)
            })
            .await?;
        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn completed_assessment_count(&self, user: UserId) -> SourceResult<i64> {
        let row = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::COMPLETED_ASSESSMENT_COUNT)
                    .bind::<BigInt, _>(user.into_inner())
                    .get_result::<CountRow>(connection)
            })
            .await?;
        Ok(row.count)
    }

    async fn message_activity(&self, candidacy: CandidacyId) -> SourceResult<MessageActivity> {
        let channels: Vec<String> = MessageChannel::ALL
            .iter()
            .map(|channel| channel.as_str().to_owned())
            .collect();
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::MESSAGE_ACTIVITY)
                    .bind::<BigInt, _>(candidacy.into_inner())
                    .bind::<Array<Text>, _>(channels)
                    .load::<ChannelRow>(connection)
            })
            .await?;

        let mut activity = MessageActivity::default();
        for row in rows {
            if let Some(channel) = MessageChannel::parse(&row.channel) {
                activity.set(
                    channel,
                    ChannelActivity {
                        count: row.event_count,
                        first_created_at: row.first_created_at,
                    },
                );
            }
        }
        Ok(activity)
    }

    async fn first_calendar_event(
        &self,
        candidacy: CandidacyId,
    ) -> SourceResult<Option<NaiveDateTime>> {
        let row = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::FIRST_CALENDAR_EVENT)
                    .bind::<BigInt, _>(candidacy.into_inner())
                    .get_result::<CalendarRow>(connection)
            })
            .await?;
        Ok(row.first_start)
    }

    async fn assessment_results(
        &self,
        user: UserId,
        assessments: &[AssessmentId],
    ) -> SourceResult<Vec<AssessmentResult>> {
        if assessments.is_empty() {
            return Ok(Vec::new());
        }
        let assessment_ids = raw_ids(assessments.iter().copied());
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::ASSESSMENT_RESULTS)
                    .bind::<BigInt, _>(user.into_inner())
                    .bind::<Array<BigInt>, _>(assessment_ids)
                    .load::<AssessmentResultRow>(connection)
            })
            .await?;
        Ok(rows.into_iter().map(AssessmentResult::from).collect())
    }

    async fn dimension_ratings(
        &self,
        candidacy: CandidacyId,
        dimensions: &[ScoringDimensionId],
    ) -> SourceResult<Vec<DimensionRating>> {
        if dimensions.is_empty() {
            return Ok(Vec::new());
        }
        let dimension_ids = raw_ids(dimensions.iter().copied());
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::DIMENSION_RATINGS)
                    .bind::<BigInt, _>(candidacy.into_inner())
                    .bind::<Array<BigInt>, _>(dimension_ids)
                    .load::<RatingRow>(connection)
            })
            .await?;
        Ok(rows.into_iter().map(DimensionRating::from).collect())
    }

    async fn custom_field_answers(
        &self,
        candidacy: CandidacyId,
        fields: &[CustomFieldId],
    ) -> SourceResult<Vec<CustomFieldAnswer>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let field_ids = raw_ids(fields.iter().copied());
        let rows = self
            .executor
            .run(move |connection| {
                diesel::sql_query(queries::CUSTOM_FIELD_ANSWERS)
                    .bind::<BigInt, _>(candidacy.into_inner())
                    .bind::<Array<BigInt>, _>(field_ids)
                    .load::<AnswerRow>(connection)
            })
            .await?;
        Ok(rows.into_iter().map(CustomFieldAnswer::from).collect())
    }
}
