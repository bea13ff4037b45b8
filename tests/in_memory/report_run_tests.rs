//! End-to-end report runs against the in-memory source.

use crate::in_memory::helpers::{orchestrator, seeded};
use crate::test_helpers::{
    EXPECTED_REPORT, FixedClock, REPORT_PATH, ScratchDir, clock, scratch,
};
use candidacy_report::report::{
    adapters::memory::InMemoryReportSource,
    domain::{JobFilter, JobId, OrganizationId},
    services::{RUN_SUMMARY_FILE, RunRequest, TargetStatus},
};
use rstest::rstest;

#[rstest]
#[case(1)]
#[case(4)]
#[tokio::test(flavor = "multi_thread")]
async fn organization_run_matches_expected_report(
    seeded: InMemoryReportSource,
    clock: FixedClock,
    scratch: ScratchDir,
    #[case] workers: usize,
) {
    let service = orchestrator(&seeded, clock, &scratch, workers);
    let request = RunRequest {
        filter: JobFilter {
            organization_id: Some(OrganizationId::new(7)),
            ..JobFilter::default()
        },
        ..RunRequest::default()
    };

    let summary = service.run(&request).await.expect("run completes");

    assert!(summary.is_success());
    assert_eq!(summary.targets.len(), 1);
    assert_eq!(scratch.read(REPORT_PATH), EXPECTED_REPORT);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn job_without_candidacies_gets_header_only_report(
    seeded: InMemoryReportSource,
    clock: FixedClock,
    scratch: ScratchDir,
) {
    let service = orchestrator(&seeded, clock, &scratch, 2);
    let request = RunRequest {
        filter: JobFilter {
            job_ids: vec![JobId::new(200)],
            ..JobFilter::default()
        },
        ..RunRequest::default()
    };

    let summary = service.run(&request).await.expect("run completes");

    assert!(summary.is_success());
    let contents = scratch.read("9/200_ops.csv");
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.ends_with("calendar_events\n"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn summary_lists_every_target(
    seeded: InMemoryReportSource,
    clock: FixedClock,
    scratch: ScratchDir,
) {
    let service = orchestrator(&seeded, clock, &scratch, 2);

    let summary = service
        .run(&RunRequest::default())
        .await
        .expect("run completes");
    service.write_summary(&summary).expect("summary written");

    let rows: Vec<usize> = summary
        .targets
        .iter()
        .map(|target| match &target.status {
            TargetStatus::Written(outcome) => outcome.rows_written,
            TargetStatus::Failed { error, .. } => panic!("unexpected failure: {error}"),
        })
        .collect();
    assert_eq!(rows, vec![2, 0]);
    let json: serde_json::Value =
        serde_json::from_str(&scratch.read(RUN_SUMMARY_FILE)).expect("summary is JSON");
    assert_eq!(json["targets"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["started_at"], "2024-06-01T12:00:00Z");
}
