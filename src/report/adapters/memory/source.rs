//! In-memory report source for tests and fixtures.
//!
//! Rows are kept in insertion order, which stands in for the surrogate-key
//! order the `PostgreSQL` queries sort by.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::report::{
    domain::{
        Assessment, AssessmentId, AssessmentResult, CandidacyId, CandidacyRecord, ChannelActivity,
        CustomField, CustomFieldAnswer, CustomFieldId, DateRange, DimensionRating, JobFilter,
        JobId, JobRef, MessageActivity, MessageChannel, OrganizationId, ScoringDimension,
        ScoringDimensionId, UserId,
    },
    ports::{ReportSource, SourceError, SourceResult},
};

/// Thread-safe in-memory report source.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReportSource {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    jobs: Vec<JobRef>,
    candidacies: Vec<CandidacyRecord>,
    assessments: BTreeMap<AssessmentId, Assessment>,
    job_assessments: Vec<(JobId, AssessmentId, i32)>,
    results: Vec<(UserId, AssessmentResult)>,
    dimension_links: Vec<(AssessmentId, ScoringDimensionId)>,
    dimensions: BTreeMap<ScoringDimensionId, ScoringDimension>,
    ratings: Vec<(CandidacyId, DimensionRating)>,
    tags: Vec<(CandidacyId, String)>,
    events: Vec<(CandidacyId, MessageChannel, NaiveDateTime)>,
    calendar: Vec<(CandidacyId, NaiveDateTime)>,
    custom_fields: Vec<(OrganizationId, CustomField)>,
    answers: Vec<(CandidacyId, CustomFieldAnswer)>,
    failing_candidacies: HashSet<CandidacyId>,
    exhausted: bool,
}

impl InMemoryReportSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> SourceResult<RwLockReadGuard<'_, InMemoryState>> {
        let state = self
            .state
            .read()
            .map_err(|err| SourceError::query(std::io::Error::other(err.to_string())))?;
        if state.exhausted {
            return Err(SourceError::exhausted(std::io::Error::other(
                "in-memory pool marked exhausted",
            )));
        }
        Ok(state)
    }

    fn read_for(&self, candidacy: CandidacyId) -> SourceResult<RwLockReadGuard<'_, InMemoryState>> {
        let state = self.read()?;
        if state.failing_candidacies.contains(&candidacy) {
            return Err(SourceError::query(std::io::Error::other(format!(
                "injected failure for candidacy {candidacy}"
            ))));
        }
        Ok(state)
    }

    /// Adds a job.
    pub fn add_job(&self, job: JobRef) {
        self.write().jobs.push(job);
    }

    /// Adds a candidacy.
    pub fn add_candidacy(&self, candidacy: CandidacyRecord) {
        self.write().candidacies.push(candidacy);
    }

    /// Registers an assessment without attaching it to a job.
    pub fn add_assessment(&self, assessment: Assessment) {
        self.write().assessments.insert(assessment.id, assessment);
    }

    /// Attaches an assessment to a job's pipeline at `sequence`.
    pub fn attach_assessment(&self, job: JobId, assessment: Assessment, sequence: i32) {
        let mut state = self.write();
        state.job_assessments.push((job, assessment.id, sequence));
        state.assessments.insert(assessment.id, assessment);
    }

    /// Records a user's assessment result.
    pub fn add_result(&self, user: UserId, result: AssessmentResult) {
        self.write().results.push((user, result));
    }

    /// Registers a scoring dimension scored by `assessment`.
    pub fn add_dimension(&self, assessment: AssessmentId, dimension: ScoringDimension) {
        let mut state = self.write();
        state.dimension_links.push((assessment, dimension.id));
        state.dimensions.insert(dimension.id, dimension);
    }

    /// Records a candidacy's rating on a scoring dimension.
    pub fn add_rating(&self, candidacy: CandidacyId, rating: DimensionRating) {
        self.write().ratings.push((candidacy, rating));
    }

    /// Tags a candidacy.
    pub fn add_tag(&self, candidacy: CandidacyId, name: impl Into<String>) {
        self.write().tags.push((candidacy, name.into()));
    }

    /// Records a messaging event.
    pub fn add_event(
        &self,
        candidacy: CandidacyId,
        channel: MessageChannel,
        created_at: NaiveDateTime,
    ) {
        self.write().events.push((candidacy, channel, created_at));
    }

    /// Records a calendar event.
    pub fn add_calendar_event(&self, candidacy: CandidacyId, start: NaiveDateTime) {
        self.write().calendar.push((candidacy, start));
    }

    /// Adds an organization custom field.
    pub fn add_custom_field(&self, organization: OrganizationId, field: CustomField) {
        self.write().custom_fields.push((organization, field));
    }

    /// Records an answer given on a candidacy to a question linked to
    /// `field`.
    pub fn add_answer(
        &self,
        candidacy: CandidacyId,
        field: CustomFieldId,
        value: impl Into<String>,
    ) {
        self.write().answers.push((
            candidacy,
            CustomFieldAnswer {
                custom_field_id: field,
                value: value.into(),
            },
        ));
    }

    /// Makes every per-candidacy lookup for `candidacy` fail.
    pub fn fail_lookups_for(&self, candidacy: CandidacyId) {
        self.write().failing_candidacies.insert(candidacy);
    }

    /// Makes every call fail as if no connection could be acquired.
    pub fn exhaust(&self) {
        self.write().exhausted = true;
    }

    fn user_of(state: &InMemoryState, candidacy: CandidacyId) -> Option<UserId> {
        state
            .candidacies
            .iter()
            .find(|record| record.id == candidacy)
            .map(|record| record.user_id)
    }
}

#[async_trait]
impl ReportSource for InMemoryReportSource {
    async fn list_jobs(&self, filter: &JobFilter) -> SourceResult<Vec<JobRef>> {
        let state = self.read()?;
        let mut jobs: Vec<JobRef> = state
            .jobs
            .iter()
            .filter(|job| {
                filter
                    .organization_id
                    .is_none_or(|organization| job.organization_id == organization)
            })
            .filter(|job| filter.job_ids.is_empty() || filter.job_ids.contains(&job.id))
            .filter(|job| {
                !filter.job_ids.is_empty()
                    || filter.candidacies_created.is_none_or(|range| {
                        state.candidacies.iter().any(|record| {
                            record.job_id == job.id && range.contains(record.created_at)
                        })
                    })
            })
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.id);
        Ok(jobs)
    }

    async fn organizations_of(&self, jobs: &[JobId]) -> SourceResult<Vec<OrganizationId>> {
        let state = self.read()?;
        let organizations: BTreeSet<OrganizationId> = state
            .jobs
            .iter()
            .filter(|job| jobs.contains(&job.id))
            .map(|job| job.organization_id)
            .collect();
        Ok(organizations.into_iter().collect())
    }

    async fn custom_fields(
        &self,
        organization: OrganizationId,
    ) -> SourceResult<Vec<CustomField>> {
        let state = self.read()?;
        let mut fields: Vec<CustomField> = state
            .custom_fields
            .iter()
            .filter(|(owner, _)| *owner == organization)
            .map(|(_, field)| field.clone())
            .collect();
        fields.sort_by_key(|field| field.id);
        Ok(fields)
    }

    async fn pipeline_assessments(&self, jobs: &[JobId]) -> SourceResult<Vec<Assessment>> {
        let state = self.read()?;
        let mut links: Vec<&(JobId, AssessmentId, i32)> = state
            .job_assessments
            .iter()
            .filter(|(job, _, _)| jobs.contains(job))
            .collect();
        links.sort_by_key(|(_, assessment, sequence)| (*sequence, *assessment));
        Ok(links
            .into_iter()
            .filter_map(|(_, assessment, _)| state.assessments.get(assessment).cloned())
            .collect())
    }

    async fn candidacies(
        &self,
        jobs: &[JobId],
        created: Option<DateRange>,
    ) -> SourceResult<Vec<CandidacyRecord>> {
        let state = self.read()?;
        let mut records: Vec<CandidacyRecord> = state
            .candidacies
            .iter()
            .filter(|record| jobs.contains(&record.job_id))
            .filter(|record| created.is_none_or(|range| range.contains(record.created_at)))
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.created_at, record.id));
        Ok(records)
    }

    async fn assessments_taken(
        &self,
        candidacies: &[CandidacyId],
    ) -> SourceResult<Vec<Assessment>> {
        let state = self.read()?;
        let users: HashSet<UserId> = candidacies
            .iter()
            .filter_map(|candidacy| Self::user_of(&state, *candidacy))
            .collect();
        let taken: BTreeSet<AssessmentId> = state
            .results
            .iter()
            .filter(|(user, _)| users.contains(user))
            .map(|(_, result)| result.assessment_id)
            .collect();
        Ok(taken
            .into_iter()
            .filter_map(|id| state.assessments.get(&id).cloned())
            .collect())
    }

    async fn dimension_ids_of(
        &self,
        assessments: &[AssessmentId],
    ) -> SourceResult<Vec<ScoringDimensionId>> {
        let state = self.read()?;
        let ids: BTreeSet<ScoringDimensionId> = state
            .dimension_links
            .iter()
            .filter(|(assessment, _)| assessments.contains(assessment))
            .map(|(_, dimension)| *dimension)
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn scoring_dimensions(
        &self,
        ids: &[ScoringDimensionId],
    ) -> SourceResult<Vec<ScoringDimension>> {
        let state = self.read()?;
        Ok(state
            .dimensions
            .values()
            .filter(|dimension| ids.contains(&dimension.id))
            .cloned()
            .collect())
    }

    async fn tag_names(&self, candidacy: CandidacyId) -> SourceResult<Vec<String>> {
        let state = self.read_for(candidacy)?;
        let mut names: Vec<String> = state
            .tags
            .iter()
            .filter(|(owner, _)| *owner == candidacy)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn completed_assessment_count(&self, user: UserId) -> SourceResult<i64> {
        let state = self.read()?;
        let failing = state
            .candidacies
            .iter()
            .any(|record| record.user_id == user && state.failing_candidacies.contains(&record.id));
        if failing {
            return Err(SourceError::query(std::io::Error::other(format!(
                "injected failure for user {user}"
            ))));
        }
        let count = state
            .results
            .iter()
            .filter(|(owner, result)| *owner == user && result.completed_at.is_some())
            .count();
        i64::try_from(count).map_err(SourceError::query)
    }

    async fn message_activity(&self, candidacy: CandidacyId) -> SourceResult<MessageActivity> {
        let state = self.read_for(candidacy)?;
        let mut activity = MessageActivity::default();
        for channel in MessageChannel::ALL {
            let mut matching = state
                .events
                .iter()
                .filter(|(owner, kind, _)| *owner == candidacy && *kind == channel)
                .map(|(_, _, created_at)| *created_at);
            let first_created_at = matching.next();
            let rest = i64::try_from(matching.count()).map_err(SourceError::query)?;
            let count = if first_created_at.is_some() { rest + 1 } else { 0 };
            activity.set(
                channel,
                ChannelActivity {
                    count,
                    first_created_at,
                },
            );
        }
        Ok(activity)
    }

    async fn first_calendar_event(
        &self,
        candidacy: CandidacyId,
    ) -> SourceResult<Option<NaiveDateTime>> {
        let state = self.read_for(candidacy)?;
        Ok(state
            .calendar
            .iter()
            .filter(|(owner, _)| *owner == candidacy)
            .map(|(_, start)| *start)
            .min())
    }

    async fn assessment_results(
        &self,
        user: UserId,
        assessments: &[AssessmentId],
    ) -> SourceResult<Vec<AssessmentResult>> {
        let state = self.read()?;
        Ok(state
            .results
            .iter()
            .filter(|(owner, result)| *owner == user && assessments.contains(&result.assessment_id))
            .map(|(_, result)| result.clone())
            .collect())
    }

    async fn dimension_ratings(
        &self,
        candidacy: CandidacyId,
        dimensions: &[ScoringDimensionId],
    ) -> SourceResult<Vec<DimensionRating>> {
        let state = self.read_for(candidacy)?;
        Ok(state
            .ratings
            .iter()
            .filter(|(owner, rating)| {
                *owner == candidacy && dimensions.contains(&rating.scoring_dimension_id)
            })
            .map(|(_, rating)| rating.clone())
            .collect())
    }

    async fn custom_field_answers(
        &self,
        candidacy: CandidacyId,
        fields: &[CustomFieldId],
    ) -> SourceResult<Vec<CustomFieldAnswer>> {
        let state = self.read_for(candidacy)?;
        Ok(state
            .answers
            .iter()
            .filter(|(owner, answer)| {
                *owner == candidacy
                    && fields.contains(&answer.custom_field_id)
                    && !answer.value.is_empty()
            })
            .map(|(_, answer)| answer.clone())
            .collect())
    }
}
