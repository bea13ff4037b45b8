//! Shared fixtures for report unit tests.

use crate::report::{
    adapters::memory::InMemoryReportSource,
    domain::{
        Assessment, AssessmentId, AssessmentResult, CandidacyId, CandidacyRecord, CustomField,
        CustomFieldAnswer, CustomFieldId, DateRange, DimensionRating, JobFilter, JobId, JobRef,
        MessageActivity, OrganizationId, ScoringDimension, ScoringDimensionId, UserId,
    },
    ports::{ReportSource, SourceResult},
};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use mockable::Clock;
use mockall::mock;
use rstest::fixture;

pub(super) const ORGANIZATION: OrganizationId = OrganizationId::new(7);
pub(super) const JOB: JobId = JobId::new(100);

// Scripted source for failure paths the in-memory source cannot stage.
mock! {
    pub(crate) Source {}

    #[async_trait]
    impl ReportSource for Source {
        async fn list_jobs(&self, filter: &JobFilter) -> SourceResult<Vec<JobRef>>;
        async fn organizations_of(&self, jobs: &[JobId]) -> SourceResult<Vec<OrganizationId>>;
        async fn custom_fields(
            &self,
            organization: OrganizationId,
        ) -> SourceResult<Vec<CustomField>>;
        async fn pipeline_assessments(&self, jobs: &[JobId]) -> SourceResult<Vec<Assessment>>;
        async fn candidacies(
            &self,
            jobs: &[JobId],
            created: Option<DateRange>,
        ) -> SourceResult<Vec<CandidacyRecord>>;
        async fn assessments_taken(
            &self,
            candidacies: &[CandidacyId],
        ) -> SourceResult<Vec<Assessment>>;
        async fn dimension_ids_of(
            &self,
            assessments: &[AssessmentId],
        ) -> SourceResult<Vec<ScoringDimensionId>>;
        async fn scoring_dimensions(
            &self,
            ids: &[ScoringDimensionId],
        ) -> SourceResult<Vec<ScoringDimension>>;
        async fn tag_names(&self, candidacy: CandidacyId) -> SourceResult<Vec<String>>;
        async fn completed_assessment_count(&self, user: UserId) -> SourceResult<i64>;
        async fn message_activity(&self, candidacy: CandidacyId) -> SourceResult<MessageActivity>;
        async fn first_calendar_event(
            &self,
            candidacy: CandidacyId,
        ) -> SourceResult<Option<NaiveDateTime>>;
        async fn assessment_results(
            &self,
            user: UserId,
            assessments: &[AssessmentId],
        ) -> SourceResult<Vec<AssessmentResult>>;
        async fn dimension_ratings(
            &self,
            candidacy: CandidacyId,
            dimensions: &[ScoringDimensionId],
        ) -> SourceResult<Vec<DimensionRating>>;
        async fn custom_field_answers(
            &self,
            candidacy: CandidacyId,
            fields: &[CustomFieldId],
        ) -> SourceResult<Vec<CustomFieldAnswer>>;
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub(super) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(super) fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid test timestamp")
}

#[fixture]
pub(super) fn clock() -> FixedClock {
    FixedClock(Utc.from_utc_datetime(&at(2024, 6, 1, 12, 0)))
}

pub(super) fn job() -> JobRef {
    JobRef::new(JOB, "Data Analyst", ORGANIZATION)
}

pub(super) fn candidacy(id: i64, user: i64, created_at: NaiveDateTime) -> CandidacyRecord {
    CandidacyRecord::new(CandidacyId::new(id), UserId::new(user), JOB, created_at)
        .with_stage("Screening")
        .with_applicant("Ada", "Lovelace", format!("user{user}@example.com"))
}

pub(super) fn result(assessment: i64, percentage: f64, completed: bool) -> AssessmentResult {
    AssessmentResult {
        assessment_id: AssessmentId::new(assessment),
        percentage_score: Some(percentage),
        started_at: Some(at(2024, 5, 2, 9, 0)),
        completed_at: completed.then(|| at(2024, 5, 2, 9, 45)),
    }
}

pub(super) fn rating(dimension: i64, percentage: f64) -> DimensionRating {
    DimensionRating {
        scoring_dimension_id: ScoringDimensionId::new(dimension),
        percentage_score: Some(percentage),
    }
}

/// One job with pipeline assessment A1, non-pipeline assessment A2 taken by
/// user 501, and dimension D1 scored by A1.
///
/// Candidacy 1 (user 501) completed A1 and A2 and was rated on D1.
/// Candidacy 2 (user 502) completed A1 only and has no rating.
#[fixture]
pub(super) fn scenario() -> InMemoryReportSource {
    let source = InMemoryReportSource::new();
    source.add_job(job());
    source.attach_assessment(JOB, Assessment::new(AssessmentId::new(1), "A1"), 1);
    source.add_assessment(Assessment::new(AssessmentId::new(2), "A2"));
    source.add_dimension(
        AssessmentId::new(1),
        ScoringDimension::new(ScoringDimensionId::new(1), "D1"),
    );
    source.add_custom_field(
        ORGANIZATION,
        CustomField::new(CustomFieldId::new(1), "LinkedIn URL"),
    );

    source.add_candidacy(candidacy(1, 501, at(2024, 5, 1, 10, 0)).with_percentile(80.0));
    source.add_candidacy(candidacy(2, 502, at(2024, 5, 3, 10, 0)).with_percentile(40.0));
    source.add_result(UserId::new(501), result(1, 90.0, true));
    source.add_result(UserId::new(501), result(2, 70.0, true));
    source.add_result(UserId::new(502), result(1, 55.0, true));
    source.add_rating(CandidacyId::new(1), rating(1, 75.0));
    source
}

/// Uniquely named directory under the system temp dir, removed on drop.
pub(super) struct ScratchDir {
    base: Utf8PathBuf,
    name: String,
    path: Utf8PathBuf,
}

impl ScratchDir {
    pub(super) fn new(prefix: &str) -> Self {
        let base = Utf8PathBuf::try_from(std::env::temp_dir()).expect("temp dir is UTF-8");
        let name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
        let dir = Dir::open_ambient_dir(&base, ambient_authority()).expect("open temp dir");
        dir.create_dir(&name).expect("create scratch dir");
        Self {
            path: base.join(&name),
            base,
            name,
        }
    }

    pub(super) fn path(&self) -> &camino::Utf8Path {
        &self.path
    }

    pub(super) fn read(&self, relative: &str) -> String {
        Dir::open_ambient_dir(&self.path, ambient_authority())
            .and_then(|dir| dir.read_to_string(relative))
            .expect("read scratch file")
    }

    pub(super) fn entries(&self, relative: &str) -> Vec<String> {
        let dir = Dir::open_ambient_dir(&self.path, ambient_authority())
            .and_then(|root| root.open_dir(relative))
            .expect("open scratch subdir");
        let mut names: Vec<String> = dir
            .entries()
            .expect("list scratch subdir")
            .map(|entry| entry.and_then(|item| item.file_name()).expect("entry name"))
            .collect();
        names.sort();
        names
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        Dir::open_ambient_dir(&self.base, ambient_authority())
            .and_then(|dir| dir.remove_dir_all(&self.name))
            .ok();
    }
}
