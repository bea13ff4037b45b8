//! Discovery of the dynamic column groups of a report.

use super::error::{ReportError, ReportResult};
use crate::report::{
    domain::{
        Assessment, AssessmentId, CandidacyId, OrganizationId, ReportDomainError, ReportSchema,
        ReportTarget, ScoringDimension, SchemaParts,
    },
    ports::ReportSource,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Resolves the report schema of a target from the source.
#[derive(Debug)]
pub struct SchemaResolver<S>
where
    S: ReportSource,
{
    source: Arc<S>,
}

impl<S> Clone for SchemaResolver<S>
where
    S: ReportSource,
{
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S> SchemaResolver<S>
where
    S: ReportSource,
{
    /// Creates a resolver over `source`.
    #[must_use]
    pub const fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Resolves the column layout for `target`.
    ///
    /// `candidacies` are the candidacies in scope; assessments their users
    /// took outside the pipeline form the non-pipeline groups.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::JobNotFound`] when no job of the target
    /// resolves to an organization, [`ReportError::SchemaAmbiguity`] when
    /// the jobs span organizations or a custom field name clashes, and a
    /// source error when a lookup fails.
    pub async fn resolve(
        &self,
        target: &ReportTarget,
        candidacies: &[CandidacyId],
    ) -> ReportResult<ReportSchema> {
        let job_ids = target.job_ids();
        let organization = self.organization(target).await?;
        let custom_fields = self.source.custom_fields(organization).await?;

        let pipeline_assessments =
            first_occurrences(self.source.pipeline_assessments(&job_ids).await?);
        let pipeline_ids: HashSet<AssessmentId> =
            pipeline_assessments.iter().map(|assessment| assessment.id).collect();
        let non_pipeline_assessments: Vec<Assessment> = first_occurrences(
            self.source
                .assessments_taken(candidacies)
                .await?
                .into_iter()
                .filter(|assessment| !pipeline_ids.contains(&assessment.id))
                .collect(),
        );

        let pipeline_dimensions = self.dimensions_of(&pipeline_assessments).await?;
        let non_pipeline_dimensions = self.dimensions_of(&non_pipeline_assessments).await?;

        debug!(
            jobs = ?job_ids,
            organization = %organization,
            pipeline_assessments = pipeline_assessments.len(),
            non_pipeline_assessments = non_pipeline_assessments.len(),
            pipeline_dimensions = pipeline_dimensions.len(),
            non_pipeline_dimensions = non_pipeline_dimensions.len(),
            custom_fields = custom_fields.len(),
            "resolved report column groups"
        );

        let schema = ReportSchema::compose(SchemaParts {
            pipeline_assessments,
            pipeline_dimensions,
            non_pipeline_assessments,
            non_pipeline_dimensions,
            custom_fields,
        })?;
        Ok(schema)
    }

    async fn organization(&self, target: &ReportTarget) -> ReportResult<OrganizationId> {
        let job_ids = target.job_ids();
        let organizations = self.source.organizations_of(&job_ids).await?;
        match organizations.as_slice() {
            [] => Err(ReportError::JobNotFound { jobs: job_ids }),
            [organization] => Ok(*organization),
            _ => Err(ReportDomainError::MixedOrganizations {
                jobs: job_ids,
                organizations,
            }
            .into()),
        }
    }

    async fn dimensions_of(
        &self,
        assessments: &[Assessment],
    ) -> ReportResult<Vec<ScoringDimension>> {
        if assessments.is_empty() {
            return Ok(Vec::new());
        }
        let assessment_ids: Vec<AssessmentId> =
            assessments.iter().map(|assessment| assessment.id).collect();
        let mut dimension_ids = self.source.dimension_ids_of(&assessment_ids).await?;
        dimension_ids.sort_unstable();
        dimension_ids.dedup();
        let dimensions = self.source.scoring_dimensions(&dimension_ids).await?;
        Ok(first_occurrences_by(dimensions, |dimension| dimension.id))
    }
}

/// Keeps the first assessment with each id, preserving order.
fn first_occurrences(assessments: Vec<Assessment>) -> Vec<Assessment> {
    first_occurrences_by(assessments, |assessment| assessment.id)
}

fn first_occurrences_by<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + std::hash::Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}
