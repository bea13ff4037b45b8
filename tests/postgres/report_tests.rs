//! End-to-end runs, read-only enforcement and timeouts.

use crate::postgres::helpers::{SeededSource, seeded_source};
use crate::test_helpers::{EXPECTED_REPORT, FixedClock, REPORT_PATH, ScratchDir, clock, scratch};
use candidacy_report::report::{
    adapters::{
        csv_writer::ReportDestination,
        postgres::{PoolSettings, PostgresReportSource},
    },
    domain::{CandidacyId, JobFilter, OrganizationId},
    ports::{ReportSource, SourceError},
    services::{AssemblySettings, ReportOrchestrator, RunRequest},
};
use diesel::RunQueryDsl;
use rstest::rstest;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn organization_run_matches_expected_report(
    seeded_source: Option<SeededSource>,
    clock: FixedClock,
    scratch: ScratchDir,
) {
    let Some(seeded) = seeded_source else {
        return;
    };
    let service = ReportOrchestrator::new(
        Arc::new(seeded.source.clone()),
        Arc::new(clock),
        AssemblySettings::new(NonZeroUsize::new(3).expect("positive")),
        ReportDestination::new(scratch.path()),
    );
    let request = RunRequest {
        filter: JobFilter {
            organization_id: Some(OrganizationId::new(7)),
            ..JobFilter::default()
        },
        ..RunRequest::default()
    };

    let summary = service.run(&request).await.expect("run completes");

    assert!(summary.is_success());
    assert_eq!(scratch.read(REPORT_PATH), EXPECTED_REPORT);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookups_run_read_only(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };

    let outcome = seeded
        .source
        .executor()
        .run(|connection| {
            diesel::sql_query("DELETE FROM e_candidacy_tags").execute(connection)
        })
        .await;

    assert!(matches!(outcome, Err(SourceError::QueryFailed(_))));
    let tags = seeded
        .source
        .tag_names(CandidacyId::new(1))
        .await
        .expect("tags survive");
    assert_eq!(tags.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_statement_is_cancelled(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };
    let settings = PoolSettings {
        statement_timeout: Duration::from_millis(50),
        ..seeded.database.settings()
    };
    let source = PostgresReportSource::connect(&settings).expect("connect");

    let outcome = source
        .executor()
        .run(|connection| diesel::sql_query("SELECT pg_sleep(2)").execute(connection))
        .await;

    let err = outcome.expect_err("statement times out");
    assert!(!err.is_fatal());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn busy_pool_reports_exhaustion(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };
    let settings = PoolSettings {
        max_size: 1,
        acquire_timeout: Duration::from_millis(200),
        ..seeded.database.settings()
    };
    let source = PostgresReportSource::connect(&settings).expect("connect");
    let held = source.executor().pool().get().expect("hold the only connection");

    let err = source
        .tag_names(CandidacyId::new(1))
        .await
        .expect_err("no connection available");
    drop(held);

    assert!(err.is_fatal());
    assert!(matches!(err, SourceError::ConnectionExhausted(_)));
}

#[rstest]
fn unreachable_server_fails_to_connect() {
    let settings = PoolSettings {
        min_idle: 1,
        acquire_timeout: Duration::from_millis(200),
        ..PoolSettings::new("postgres://nobody@127.0.0.1:1/none")
    };

    let err = PostgresReportSource::connect(&settings).expect_err("nothing listens on port 1");

    assert!(err.is_fatal());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rows_added_between_lookups_are_visible(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };
    let alan = CandidacyId::new(2);
    assert!(seeded.source.tag_names(alan).await.expect("tags").is_empty());

    seeded
        .database
        .execute("INSERT INTO e_candidacy_tags (candidacy_id, tag_id) VALUES (2, 2)")
        .expect("insert succeeds outside the report source");

    assert_eq!(
        seeded.source.tag_names(alan).await.expect("tags"),
        vec!["referral"]
    );
}
