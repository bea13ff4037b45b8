//! Row assembly: one flat value sequence per candidacy.
//!
//! Each row runs a fixed, ordered list of lookups ([`RowLookup::ALL`]) and
//! renders every schema column from the loaded candidacy record plus the
//! lookup results. Rows are built concurrently, at most
//! [`AssemblySettings::workers`] at a time, and returned in submission
//! order.
//!
//! A lookup that fails with [`SourceError::QueryFailed`] drops only that
//! candidacy's row. [`SourceError::ConnectionExhausted`] aborts every
//! outstanding row.

use super::error::{ReportError, ReportResult};
use crate::report::{
    domain::{
        AssessmentId, AssessmentMetric, AssessmentResult, CandidacyId, CandidacyRecord,
        ColumnSource, CustomFieldId, DimensionMetric, FixedColumn, MessageActivity,
        ReportRow, ReportSchema, ReportTarget, ScoringDimensionId, cell, text_cell,
        timestamp_cell,
    },
    ports::{ReportSource, SourceError},
};
use chrono::NaiveDateTime;
use mockable::Clock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Separator placed between a candidacy's tag names.
pub const TAG_SEPARATOR: &str = "; ";

/// Concurrency settings for row assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblySettings {
    /// Maximum number of rows assembled at once.
    pub workers: NonZeroUsize,
}

impl AssemblySettings {
    /// Creates settings with an explicit worker count.
    #[must_use]
    pub const fn new(workers: NonZeroUsize) -> Self {
        Self { workers }
    }
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Named per-row lookups, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowLookup {
    /// Tag names of the candidacy.
    Tags,
    /// Completed assessment count of the user.
    CompletedAssessments,
    /// Email and SMS event activity.
    MessageActivity,
    /// Earliest calendar event.
    Calendar,
    /// Assessment results for every assessment column group.
    AssessmentResults,
    /// Ratings for every scoring dimension column group.
    DimensionRatings,
    /// Answers for every custom field column.
    CustomFieldAnswers,
}

impl RowLookup {
    /// Every lookup in execution order.
    pub const ALL: [Self; 7] = [
        Self::Tags,
        Self::CompletedAssessments,
        Self::MessageActivity,
        Self::Calendar,
        Self::AssessmentResults,
        Self::DimensionRatings,
        Self::CustomFieldAnswers,
    ];

    /// Stable name used in logs and run summaries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::CompletedAssessments => "completed_assessments",
            Self::MessageActivity => "message_activity",
            Self::Calendar => "calendar",
            Self::AssessmentResults => "assessment_results",
            Self::DimensionRatings => "dimension_ratings",
            Self::CustomFieldAnswers => "custom_field_answers",
        }
    }
}

impl fmt::Display for RowLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lookup failure that dropped one candidacy's row.
#[derive(Debug, Clone)]
pub struct LookupFailure {
    /// Lookup that failed.
    pub lookup: RowLookup,
    /// Source error.
    pub error: SourceError,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lookup failed: {}", self.lookup, self.error)
    }
}

/// A candidacy left out of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// Candidacy whose row was dropped.
    pub candidacy_id: CandidacyId,
    /// Lookup that failed.
    pub lookup: RowLookup,
    /// Rendered error.
    pub reason: String,
}

/// Rows of one report plus the candidacies that could not be assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledRows {
    /// Rows in candidacy order.
    pub rows: Vec<ReportRow>,
    /// Candidacies whose row failed, in candidacy order.
    pub failures: Vec<RowFailure>,
}

/// Builds report rows for candidacies.
#[derive(Debug)]
pub struct RowAssembler<S, C>
where
    S: ReportSource,
    C: Clock + Send + Sync,
{
    source: Arc<S>,
    clock: Arc<C>,
    settings: AssemblySettings,
}

impl<S, C> Clone for RowAssembler<S, C>
where
    S: ReportSource,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            clock: Arc::clone(&self.clock),
            settings: self.settings,
        }
    }
}

impl<S, C> RowAssembler<S, C>
where
    S: ReportSource + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an assembler.
    #[must_use]
    pub const fn new(source: Arc<S>, clock: Arc<C>, settings: AssemblySettings) -> Self {
        Self {
            source,
            clock,
            settings,
        }
    }

    /// Builds the row of a single candidacy.
    ///
    /// # Errors
    ///
    /// Returns the first failing lookup.
    pub async fn assemble_row(
        &self,
        target: &ReportTarget,
        schema: Arc<ReportSchema>,
        candidacy: &CandidacyRecord,
    ) -> Result<ReportRow, LookupFailure> {
        self.context(target, schema).build(candidacy).await
    }

    /// Builds rows for every candidacy, preserving the input order.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::ConnectionExhausted`] when any row runs out of
    /// connections and [`ReportError::WorkerPanicked`] when a row task
    /// panics. Outstanding rows are aborted in both cases.
    pub async fn assemble_all(
        &self,
        target: &ReportTarget,
        schema: Arc<ReportSchema>,
        candidacies: Vec<CandidacyRecord>,
    ) -> ReportResult<AssembledRows> {
        let context = Arc::new(self.context(target, schema));
        let semaphore = Arc::new(Semaphore::new(self.settings.workers.get()));
        let total = candidacies.len();
        let mut tasks = JoinSet::new();

        for (index, candidacy) in candidacies.into_iter().enumerate() {
            let row_context = Arc::clone(&context);
            let permits = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let permit = permits.acquire_owned().await;
                let outcome = row_context.build(&candidacy).await;
                drop(permit);
                (index, candidacy.id, outcome)
            });
        }

        let mut slots: Vec<Option<ReportRow>> = (0..total).map(|_| None).collect();
        let mut failures: Vec<(usize, RowFailure)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, candidacy_id, outcome) = match joined {
                Ok(finished) => finished,
                Err(err) => {
                    tasks.abort_all();
                    return Err(ReportError::WorkerPanicked(err));
                }
            };
            match outcome {
                Ok(row) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(row);
                    }
                }
                Err(failure) if failure.error.is_fatal() => {
                    tasks.abort_all();
                    return Err(failure.error.into());
                }
                Err(failure) => {
                    warn!(
                        candidacy_id = %candidacy_id,
                        lookup = %failure.lookup,
                        error = %failure.error,
                        "dropping candidacy row"
                    );
                    failures.push((
                        index,
                        RowFailure {
                            candidacy_id,
                            lookup: failure.lookup,
                            reason: failure.to_string(),
                        },
                    ));
                }
            }
        }

        failures.sort_by_key(|(index, _)| *index);
        let rows: Vec<ReportRow> = slots.into_iter().flatten().collect();
        debug!(rows = rows.len(), failed = failures.len(), "assembled report rows");
        Ok(AssembledRows {
            rows,
            failures: failures.into_iter().map(|(_, failure)| failure).collect(),
        })
    }

    fn context(&self, target: &ReportTarget, schema: Arc<ReportSchema>) -> RowContext<S, C> {
        RowContext {
            source: Arc::clone(&self.source),
            clock: Arc::clone(&self.clock),
            target: target.clone(),
            assessment_ids: schema.assessment_ids(),
            dimension_ids: schema.dimension_ids(),
            custom_field_ids: schema.custom_field_ids(),
            schema,
        }
    }
}

/// Everything a row task needs, shared across tasks of one report.
struct RowContext<S, C> {
    source: Arc<S>,
    clock: Arc<C>,
    schema: Arc<ReportSchema>,
    target: ReportTarget,
    assessment_ids: Vec<AssessmentId>,
    dimension_ids: Vec<ScoringDimensionId>,
    custom_field_ids: Vec<CustomFieldId>,
}

impl<S, C> RowContext<S, C>
where
    S: ReportSource,
    C: Clock + Send + Sync,
{
    async fn build(&self, candidacy: &CandidacyRecord) -> Result<ReportRow, LookupFailure> {
        let mut values = LookupValues::default();
        for lookup in RowLookup::ALL {
            self.run(lookup, candidacy, &mut values)
                .await
                .map_err(|error| LookupFailure { lookup, error })?;
        }

        let cells = RowCells {
            candidacy,
            job_name: self.target.job_name(candidacy.job_id),
            elapsed_seconds: elapsed_seconds(self.clock.utc().naive_utc(), candidacy.created_at),
            values: &values,
        };
        let rendered = self
            .schema
            .columns()
            .iter()
            .map(|column| cells.render(column.source()))
            .collect();
        Ok(ReportRow::new(candidacy.id, rendered))
    }

    async fn run(
        &self,
        lookup: RowLookup,
        candidacy: &CandidacyRecord,
        values: &mut LookupValues,
    ) -> Result<(), SourceError> {
        match lookup {
            RowLookup::Tags => {
                values.tags = self.source.tag_names(candidacy.id).await?.join(TAG_SEPARATOR);
            }
            RowLookup::CompletedAssessments => {
                values.completed_assessments = self
                    .source
                    .completed_assessment_count(candidacy.user_id)
                    .await?;
            }
            RowLookup::MessageActivity => {
                values.activity = self.source.message_activity(candidacy.id).await?;
            }
            RowLookup::Calendar => {
                values.calendar = self.source.first_calendar_event(candidacy.id).await?;
            }
            RowLookup::AssessmentResults => {
                for result in self
                    .source
                    .assessment_results(candidacy.user_id, &self.assessment_ids)
                    .await?
                {
                    values.results.entry(result.assessment_id).or_insert(result);
                }
            }
            RowLookup::DimensionRatings => {
                for rating in self
                    .source
                    .dimension_ratings(candidacy.id, &self.dimension_ids)
                    .await?
                {
                    values
                        .ratings
                        .entry(rating.scoring_dimension_id)
                        .or_insert(rating.percentage_score);
                }
            }
            RowLookup::CustomFieldAnswers => {
                for answer in self
                    .source
                    .custom_field_answers(candidacy.id, &self.custom_field_ids)
                    .await?
                    .into_iter()
                    .filter(|answer| !answer.value.is_empty())
                {
                    values
                        .answers
                        .entry(answer.custom_field_id)
                        .or_insert(answer.value);
                }
            }
        }
        Ok(())
    }
}

/// Lookup results for one candidacy. Maps keep the first entry per key.
#[derive(Debug, Default)]
struct LookupValues {
    tags: String,
    completed_assessments: i64,
    activity: MessageActivity,
    calendar: Option<NaiveDateTime>,
    results: HashMap<AssessmentId, AssessmentResult>,
    ratings: HashMap<ScoringDimensionId, Option<f64>>,
    answers: HashMap<CustomFieldId, String>,
}

struct RowCells<'a> {
    candidacy: &'a CandidacyRecord,
    job_name: Option<&'a str>,
    elapsed_seconds: i64,
    values: &'a LookupValues,
}

impl RowCells<'_> {
    fn render(&self, source: ColumnSource) -> String {
        match source {
            ColumnSource::Fixed(column) => self.fixed(column),
            ColumnSource::Assessment {
                assessment_id,
                metric,
            } => self.assessment(assessment_id, metric),
            ColumnSource::Dimension {
                scoring_dimension_id,
                metric,
            } => match metric {
                DimensionMetric::Percentage => cell(
                    self.values
                        .ratings
                        .get(&scoring_dimension_id)
                        .copied()
                        .flatten(),
                ),
                DimensionMetric::Percentile => cell(self.candidacy.percentile),
            },
            ColumnSource::CustomField(field) => {
                self.values.answers.get(&field).cloned().unwrap_or_default()
            }
        }
    }

    fn fixed(&self, column: FixedColumn) -> String {
        let candidacy = self.candidacy;
        let activity = &self.values.activity;
        match column {
            FixedColumn::UserId => candidacy.user_id.to_string(),
            FixedColumn::UserLastName => text_cell(candidacy.last_name.as_deref()),
            FixedColumn::UserFirstName => text_cell(candidacy.first_name.as_deref()),
            FixedColumn::UserEmail => text_cell(candidacy.email.as_deref()),
            FixedColumn::UserCountryCode => text_cell(candidacy.country_code.as_deref()),
            FixedColumn::UserPhone => text_cell(candidacy.phone.as_deref()),
            FixedColumn::CandidacyId => candidacy.id.to_string(),
            FixedColumn::CandidacyCreatedAt => timestamp_cell(Some(candidacy.created_at)),
            FixedColumn::CandidacyPipelineStage => text_cell(candidacy.pipeline_stage.as_deref()),
            FixedColumn::CandidacyStatus => text_cell(candidacy.status.as_deref()),
            FixedColumn::CandidacyFailed => cell(candidacy.failed),
            FixedColumn::JobName => text_cell(self.job_name),
            FixedColumn::Tags => self.values.tags.clone(),
            FixedColumn::Percentile => cell(candidacy.percentile),
            FixedColumn::WeightedPercentageScore => cell(candidacy.weighted_percentage_score),
            FixedColumn::AssessmentsRemaining => cell(candidacy.remaining_assessment_count),
            FixedColumn::AssessmentsCompleted => self.values.completed_assessments.to_string(),
            FixedColumn::HoursSinceApplication => self.elapsed_seconds.to_string(),
            FixedColumn::EmailMessagesCount => activity.email.count.to_string(),
            FixedColumn::SmsMessagesCount => activity.sms.count.to_string(),
            FixedColumn::LastEmailCreatedAt => timestamp_cell(activity.email.first_created_at),
            FixedColumn::LastSmsCreatedAt => timestamp_cell(activity.sms.first_created_at),
            FixedColumn::CalendarEvents => timestamp_cell(self.values.calendar),
        }
    }

    fn assessment(&self, assessment_id: AssessmentId, metric: AssessmentMetric) -> String {
        let Some(result) = self.values.results.get(&assessment_id) else {
            return String::new();
        };
        match metric {
            AssessmentMetric::Percentage => cell(result.percentage_score),
            AssessmentMetric::Percentile => cell(self.candidacy.percentile),
            AssessmentMetric::Score => cell(self.candidacy.score),
            AssessmentMetric::StartedAt => timestamp_cell(result.started_at),
            AssessmentMetric::CompletedAt => timestamp_cell(result.completed_at),
        }
    }
}

/// Whole seconds from `created_at` to `now`, rounded half up.
fn elapsed_seconds(now: NaiveDateTime, created_at: NaiveDateTime) -> i64 {
    (now - created_at)
        .num_milliseconds()
        .saturating_add(500)
        .div_euclid(1000)
}
