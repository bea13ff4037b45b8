//! Seeded in-memory source for report integration tests.

use crate::test_helpers::{FixedClock, ScratchDir, at};
use candidacy_report::report::{
    adapters::{csv_writer::ReportDestination, memory::InMemoryReportSource},
    domain::{
        Assessment, AssessmentId, AssessmentResult, CandidacyId, CandidacyRecord, CustomField,
        CustomFieldId, DimensionRating, JobId, JobRef, MessageChannel, OrganizationId,
        ScoringDimension, ScoringDimensionId, UserId,
    },
    services::{AssemblySettings, ReportOrchestrator},
};
use rstest::fixture;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Orchestrator over the in-memory source.
pub type TestOrchestrator = ReportOrchestrator<InMemoryReportSource, FixedClock>;

const ORGANIZATION: OrganizationId = OrganizationId::new(7);
const JOB: JobId = JobId::new(100);

fn completed_result(assessment: i64, percentage: f64) -> AssessmentResult {
    AssessmentResult {
        assessment_id: AssessmentId::new(assessment),
        percentage_score: Some(percentage),
        started_at: Some(at(2024, 5, 2, 9, 0)),
        completed_at: Some(at(2024, 5, 2, 9, 45)),
    }
}

fn applicant(
    id: i64,
    user: i64,
    created_at: chrono::NaiveDateTime,
    first_name: &str,
    last_name: &str,
) -> CandidacyRecord {
    let mut record = CandidacyRecord::new(CandidacyId::new(id), UserId::new(user), JOB, created_at)
        .with_stage("Screening")
        .with_applicant(first_name, last_name, format!("user{user}@example.com"));
    record.status = Some("active".to_owned());
    record
}

/// Source holding the same hiring data as `tests/fixtures/report_seed.sql`.
#[fixture]
pub fn seeded() -> InMemoryReportSource {
    let source = InMemoryReportSource::new();
    source.add_job(JobRef::new(JOB, "Data Analyst", ORGANIZATION));
    source.add_job(JobRef::new(JobId::new(200), "Ops", OrganizationId::new(9)));
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

    let mut ada = applicant(1, 501, at(2024, 5, 1, 10, 0), "Ada", "Lovelace")
        .with_score(12.5)
        .with_percentile(80.0);
    ada.failed = Some(false);
    ada.weighted_percentage_score = Some(66.5);
    ada.remaining_assessment_count = Some(0);
    ada.country_code = Some("+44".to_owned());
    ada.phone = Some("7700900001".to_owned());
    source.add_candidacy(ada);

    let mut alan =
        applicant(2, 502, at(2024, 5, 3, 10, 0), "Alan", "Turing").with_percentile(40.0);
    alan.failed = Some(true);
    alan.remaining_assessment_count = Some(1);
    source.add_candidacy(alan);

    source.add_result(UserId::new(501), completed_result(1, 90.0));
    source.add_result(UserId::new(501), completed_result(2, 70.0));
    source.add_result(UserId::new(502), completed_result(1, 55.0));
    for percentage in [75.0, 10.0] {
        source.add_rating(
            CandidacyId::new(1),
            DimensionRating {
                scoring_dimension_id: ScoringDimensionId::new(1),
                percentage_score: Some(percentage),
            },
        );
    }

    let ada_id = CandidacyId::new(1);
    source.add_tag(ada_id, "shortlist");
    source.add_tag(ada_id, "referral");
    source.add_event(ada_id, MessageChannel::Email, at(2024, 5, 4, 8, 0));
    source.add_event(ada_id, MessageChannel::Email, at(2024, 5, 2, 8, 0));
    source.add_event(ada_id, MessageChannel::Sms, at(2024, 5, 5, 18, 30));
    source.add_calendar_event(ada_id, at(2024, 5, 20, 14, 0));
    source.add_calendar_event(ada_id, at(2024, 5, 10, 9, 0));
    source.add_answer(ada_id, CustomFieldId::new(1), "");
    source.add_answer(ada_id, CustomFieldId::new(1), "https://example.com/in/ada");
    source.add_answer(CandidacyId::new(2), CustomFieldId::new(1), "");
    source
}

/// Builds an orchestrator writing into `scratch`.
pub fn orchestrator(
    source: &InMemoryReportSource,
    clock: FixedClock,
    scratch: &ScratchDir,
    workers: usize,
) -> TestOrchestrator {
    ReportOrchestrator::new(
        Arc::new(source.clone()),
        Arc::new(clock),
        AssemblySettings::new(NonZeroUsize::new(workers).expect("positive worker count")),
        ReportDestination::new(scratch.path()),
    )
}
