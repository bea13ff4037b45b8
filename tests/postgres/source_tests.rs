//! Individual report lookups against the seeded tables.

use crate::postgres::helpers::{SeededSource, seeded_source};
use crate::test_helpers::at;
use candidacy_report::report::{
    domain::{
        AssessmentId, CandidacyId, CustomFieldId, DateRange, JobFilter, JobId, JobRef,
        OrganizationId, ScoringDimensionId, UserId,
    },
    ports::ReportSource,
};
use chrono::NaiveDate;
use rstest::rstest;

fn job_ids(jobs: Vec<JobRef>) -> Vec<i64> {
    jobs.into_iter().map(|job| job.id.into_inner()).collect()
}

fn may() -> DateRange {
    DateRange::from_days(
        NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2024, 5, 31).expect("valid date"),
    )
    .expect("valid range")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn jobs_are_filtered_and_ordered(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };
    let source = &seeded.source;

    let all = source.list_jobs(&JobFilter::default()).await.expect("all jobs");
    let ops = source
        .list_jobs(&JobFilter {
            organization_id: Some(OrganizationId::new(9)),
            ..JobFilter::default()
        })
        .await
        .expect("organization filter");
    let active_in_may = source
        .list_jobs(&JobFilter {
            candidacies_created: Some(may()),
            ..JobFilter::default()
        })
        .await
        .expect("range filter");
    let requested_outside_range = source
        .list_jobs(&JobFilter {
            job_ids: vec![JobId::new(200)],
            candidacies_created: Some(may()),
            ..JobFilter::default()
        })
        .await
        .expect("ids with range");
    let explicit = source
        .list_jobs(&JobFilter {
            job_ids: vec![JobId::new(200)],
            ..JobFilter::default()
        })
        .await
        .expect("id filter");

    assert_eq!(job_ids(all), vec![100, 200]);
    assert_eq!(job_ids(ops), vec![200]);
    assert_eq!(job_ids(active_in_may), vec![100]);
    assert_eq!(job_ids(explicit), vec![200]);
    assert_eq!(job_ids(requested_outside_range), vec![200]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn candidacies_need_a_pipeline_stage(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };

    let records = seeded
        .source
        .candidacies(&[JobId::new(100)], None)
        .await
        .expect("candidacies load");

    let ids: Vec<CandidacyId> = records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![CandidacyId::new(1), CandidacyId::new(2)]);
    let ada = records.first().expect("first candidacy");
    assert_eq!(ada.created_at, at(2024, 5, 1, 10, 0));
    assert_eq!(ada.pipeline_stage.as_deref(), Some("Screening"));
    assert_eq!(ada.score, Some(12.5));
    assert_eq!(ada.remaining_assessment_count, Some(0));
    assert_eq!(ada.country_code.as_deref(), Some("+44"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn candidacy_range_is_half_open(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };
    let range = DateRange::new(at(2024, 5, 1, 10, 0), at(2024, 5, 3, 10, 0)).expect("range");

    let records = seeded
        .source
        .candidacies(&[JobId::new(100)], Some(range))
        .await
        .expect("candidacies load");

    assert_eq!(
        records.iter().map(|record| record.id).collect::<Vec<_>>(),
        vec![CandidacyId::new(1)]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn schema_lookups_return_groups(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };
    let source = &seeded.source;

    let organizations = source
        .organizations_of(&[JobId::new(100), JobId::new(200)])
        .await
        .expect("organizations");
    let fields = source
        .custom_fields(OrganizationId::new(7))
        .await
        .expect("custom fields");
    let pipeline = source
        .pipeline_assessments(&[JobId::new(100)])
        .await
        .expect("pipeline");
    let taken = source
        .assessments_taken(&[CandidacyId::new(1), CandidacyId::new(2)])
        .await
        .expect("taken");
    let dimension_ids = source
        .dimension_ids_of(&[AssessmentId::new(1), AssessmentId::new(2)])
        .await
        .expect("dimension ids");
    let dimensions = source
        .scoring_dimensions(&dimension_ids)
        .await
        .expect("dimensions");

    assert_eq!(
        organizations,
        vec![OrganizationId::new(7), OrganizationId::new(9)]
    );
    assert_eq!(
        fields.iter().map(|field| field.name.as_str()).collect::<Vec<_>>(),
        vec!["LinkedIn URL"]
    );
    assert_eq!(
        pipeline.iter().map(|assessment| assessment.id).collect::<Vec<_>>(),
        vec![AssessmentId::new(1)]
    );
    assert_eq!(
        taken.iter().map(|assessment| assessment.name.as_str()).collect::<Vec<_>>(),
        vec!["A1", "A2"]
    );
    assert_eq!(dimension_ids, vec![ScoringDimensionId::new(1)]);
    assert_eq!(
        dimensions.iter().map(|dimension| dimension.name.as_str()).collect::<Vec<_>>(),
        vec!["D1"]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn row_lookups_return_candidacy_details(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };
    let source = &seeded.source;
    let ada = CandidacyId::new(1);

    let tags = source.tag_names(ada).await.expect("tags");
    let completed = source
        .completed_assessment_count(UserId::new(501))
        .await
        .expect("completed");
    let activity = source.message_activity(ada).await.expect("activity");
    let calendar = source.first_calendar_event(ada).await.expect("calendar");
    let results = source
        .assessment_results(UserId::new(501), &[AssessmentId::new(1), AssessmentId::new(2)])
        .await
        .expect("results");
    let ratings = source
        .dimension_ratings(ada, &[ScoringDimensionId::new(1)])
        .await
        .expect("ratings");
    let answers = source
        .custom_field_answers(ada, &[CustomFieldId::new(1)])
        .await
        .expect("answers");

    assert_eq!(tags, vec!["referral", "shortlist"]);
    assert_eq!(completed, 2);
    assert_eq!(activity.email.count, 2);
    assert_eq!(activity.email.first_created_at, Some(at(2024, 5, 4, 8, 0)));
    assert_eq!(activity.sms.count, 1);
    assert_eq!(calendar, Some(at(2024, 5, 10, 9, 0)));
    assert_eq!(
        results.iter().map(|result| result.percentage_score).collect::<Vec<_>>(),
        vec![Some(90.0), Some(70.0)]
    );
    assert_eq!(
        ratings.iter().map(|rating| rating.percentage_score).collect::<Vec<_>>(),
        vec![Some(75.0), Some(10.0)]
    );
    assert_eq!(
        answers.iter().map(|answer| answer.value.as_str()).collect::<Vec<_>>(),
        vec!["https://example.com/in/ada"]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn candidacy_without_activity_has_empty_lookups(seeded_source: Option<SeededSource>) {
    let Some(seeded) = seeded_source else {
        return;
    };
    let source = &seeded.source;
    let alan = CandidacyId::new(2);

    let activity = source.message_activity(alan).await.expect("activity");
    let calendar = source.first_calendar_event(alan).await.expect("calendar");
    let tags = source.tag_names(alan).await.expect("tags");
    let no_fields = source.custom_field_answers(alan, &[]).await.expect("answers");

    assert_eq!(activity.email.count, 0);
    assert_eq!(activity.sms.first_created_at, None);
    assert_eq!(calendar, None);
    assert!(tags.is_empty());
    assert!(no_fields.is_empty());
}
