//! Job orchestration: discover jobs, compile each report and summarize.
//!
//! Targets run one after another. A target that fails is recorded in the
//! run summary and the run moves on to the next target, except when the
//! connection pool is exhausted, which ends the run.

use super::{
    assembler::{AssemblySettings, RowAssembler, RowFailure},
    error::{ReportError, ReportResult},
    resolver::SchemaResolver,
};
use crate::report::{
    adapters::csv_writer::{ReportDestination, WriteMode},
    domain::{
        CandidacyId, JobFilter, JobId, JobRef, OrganizationId, ReportTarget, ReportingPeriod,
    },
    ports::ReportSource,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// File name of the run summary written into the destination root.
pub const RUN_SUMMARY_FILE: &str = "run-summary.json";

/// What a run should report on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    /// Jobs to report on.
    pub filter: JobFilter,
    /// Report all jobs of an organization in one file.
    pub combine: bool,
    /// Split the candidacy range into one report per calendar month.
    pub monthly: bool,
}

/// Result of one written report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    /// Organization owning the jobs.
    pub organization_id: OrganizationId,
    /// Written file.
    pub path: Utf8PathBuf,
    /// Number of columns in the header.
    pub columns: usize,
    /// Number of rows written.
    pub rows_written: usize,
    /// Candidacies left out because a lookup failed.
    pub failed_candidacies: Vec<RowFailure>,
}

/// Whether a target produced a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    /// The report was written.
    Written(JobOutcome),
    /// The report was aborted before writing.
    Failed {
        /// Error kind, as returned by [`ReportError::kind`].
        kind: String,
        /// Rendered error.
        error: String,
    },
}

/// Outcome of one target of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    /// Jobs covered.
    pub jobs: Vec<JobId>,
    /// Reporting month, when the run is split by month.
    pub period: Option<String>,
    /// Result.
    #[serde(flatten)]
    pub status: TargetStatus,
}

impl TargetOutcome {
    /// Whether the target failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.status, TargetStatus::Failed { .. })
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Per-target outcomes in execution order.
    pub targets: Vec<TargetOutcome>,
}

impl RunSummary {
    /// Number of targets that failed.
    #[must_use]
    pub fn failed_targets(&self) -> usize {
        self.targets.iter().filter(|target| target.is_failed()).count()
    }

    /// Number of candidacy rows dropped across all written reports.
    #[must_use]
    pub fn failed_rows(&self) -> usize {
        self.targets
            .iter()
            .map(|target| match &target.status {
                TargetStatus::Written(outcome) => outcome.failed_candidacies.len(),
                TargetStatus::Failed { .. } => 0,
            })
            .sum()
    }

    /// Whether every target produced a report.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_targets() == 0
    }
}

/// Drives schema resolution, row assembly and writing for each target.
#[derive(Debug)]
pub struct ReportOrchestrator<S, C>
where
    S: ReportSource,
    C: Clock + Send + Sync,
{
    source: Arc<S>,
    clock: Arc<C>,
    resolver: SchemaResolver<S>,
    assembler: RowAssembler<S, C>,
    destination: ReportDestination,
    mode: WriteMode,
}

impl<S, C> ReportOrchestrator<S, C>
where
    S: ReportSource + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an orchestrator writing under `destination`.
    #[must_use]
    pub fn new(
        source: Arc<S>,
        clock: Arc<C>,
        settings: AssemblySettings,
        destination: ReportDestination,
    ) -> Self {
        Self {
            resolver: SchemaResolver::new(Arc::clone(&source)),
            assembler: RowAssembler::new(Arc::clone(&source), Arc::clone(&clock), settings),
            source,
            clock,
            destination,
            mode: WriteMode::default(),
        }
    }

    /// Sets how existing report files are treated.
    #[must_use]
    pub const fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the output destination.
    #[must_use]
    pub const fn destination(&self) -> &ReportDestination {
        &self.destination
    }

    /// Compiles and writes the report of one target.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when candidacies cannot be loaded, the
    /// schema cannot be resolved, the connection pool is exhausted or the
    /// file cannot be written. Nothing is written in those cases.
    pub async fn compile(
        &self,
        target: &ReportTarget,
        period: Option<&ReportingPeriod>,
    ) -> ReportResult<JobOutcome> {
        let job_ids = target.job_ids();
        let candidacies = self
            .source
            .candidacies(&job_ids, target.candidacies_created())
            .await?;
        let candidacy_ids: Vec<CandidacyId> =
            candidacies.iter().map(|candidacy| candidacy.id).collect();

        let schema = Arc::new(self.resolver.resolve(target, &candidacy_ids).await?);
        let organization_id = target
            .organization_id()
            .ok_or_else(|| ReportError::JobNotFound {
                jobs: job_ids.clone(),
            })?;
        let assembled = self
            .assembler
            .assemble_all(target, Arc::clone(&schema), candidacies)
            .await?;

        let relative =
            ReportDestination::relative_path(organization_id, period, &target.file_stem());
        let path = self.destination.write_report(
            &relative,
            &schema.headers(),
            &assembled.rows,
            self.mode,
        )?;

        let outcome = JobOutcome {
            organization_id,
            path,
            columns: schema.len(),
            rows_written: assembled.rows.len(),
            failed_candidacies: assembled.failures,
        };
        if outcome.failed_candidacies.is_empty() {
            info!(
                jobs = ?job_ids,
                rows = outcome.rows_written,
                columns = outcome.columns,
                path = %outcome.path,
                "report written"
            );
        } else {
            let failed: Vec<CandidacyId> = outcome
                .failed_candidacies
                .iter()
                .map(|failure| failure.candidacy_id)
                .collect();
            warn!(
                jobs = ?job_ids,
                rows = outcome.rows_written,
                failed = failed.len(),
                failed_candidacies = ?failed,
                path = %outcome.path,
                "report written without some candidacies"
            );
        }
        Ok(outcome)
    }

    /// Runs every target selected by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when the job list cannot be loaded and
    /// [`ReportError::ConnectionExhausted`] when any target runs out of
    /// connections. Other failures of individual targets are recorded in
    /// the summary.
    pub async fn run(&self, request: &RunRequest) -> ReportResult<RunSummary> {
        let started_at = self.clock.utc();
        let jobs = self.source.list_jobs(&request.filter).await?;
        let mut targets = Vec::new();

        for missing in missing_jobs(&request.filter, &jobs) {
            warn!(job_id = %missing, "requested job not found");
            targets.push(failed_outcome(
                vec![missing],
                None,
                &ReportError::JobNotFound {
                    jobs: vec![missing],
                },
            ));
        }

        let range = request.filter.candidacies_created;
        if request.monthly && range.is_none() {
            warn!("monthly split requested without a date range; running a single report");
        }
        let periods = match range {
            Some(bounds) if request.monthly => ReportingPeriod::monthly(&bounds)
                .into_iter()
                .map(|(period, clipped)| (Some(period), Some(clipped)))
                .collect(),
            _ => vec![(None, range)],
        };

        for base in build_targets(jobs, request.combine) {
            for (period, window) in &periods {
                let target = match window {
                    Some(bounds) => base.clone().with_created_within(*bounds),
                    None => base.clone(),
                };
                targets.push(self.run_target(&target, period.as_ref()).await?);
            }
        }

        let summary = RunSummary {
            started_at,
            finished_at: self.clock.utc(),
            targets,
        };
        info!(
            targets = summary.targets.len(),
            failed_targets = summary.failed_targets(),
            failed_rows = summary.failed_rows(),
            "report run finished"
        );
        Ok(summary)
    }

    /// Writes `summary` as JSON into the destination root.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Summary`] when encoding fails and
    /// [`ReportError::Write`] when the file cannot be written.
    pub fn write_summary(&self, summary: &RunSummary) -> ReportResult<Utf8PathBuf> {
        let encoded = serde_json::to_vec_pretty(summary).map_err(ReportError::Summary)?;
        let path = self
            .destination
            .write_document(Utf8Path::new(RUN_SUMMARY_FILE), &encoded)?;
        Ok(path)
    }

    async fn run_target(
        &self,
        target: &ReportTarget,
        period: Option<&ReportingPeriod>,
    ) -> ReportResult<TargetOutcome> {
        let label = period.map(ReportingPeriod::label);
        match self.compile(target, period).await {
            Ok(outcome) => Ok(TargetOutcome {
                jobs: target.job_ids(),
                period: label,
                status: TargetStatus::Written(outcome),
            }),
            Err(err @ ReportError::ConnectionExhausted(_)) => {
                error!(
                    jobs = ?target.job_ids(),
                    error = %err,
                    "connection pool exhausted; stopping the run"
                );
                Err(err)
            }
            Err(err) => {
                error!(
                    jobs = ?target.job_ids(),
                    period = label.as_deref().unwrap_or("all"),
                    kind = err.kind(),
                    error = %err,
                    "report failed"
                );
                Ok(failed_outcome(target.job_ids(), label, &err))
            }
        }
    }
}

fn failed_outcome(jobs: Vec<JobId>, period: Option<String>, err: &ReportError) -> TargetOutcome {
    TargetOutcome {
        jobs,
        period,
        status: TargetStatus::Failed {
            kind: err.kind().to_owned(),
            error: err.to_string(),
        },
    }
}

/// Explicitly requested jobs the source did not return.
fn missing_jobs(filter: &JobFilter, found: &[JobRef]) -> Vec<JobId> {
    filter
        .job_ids
        .iter()
        .copied()
        .filter(|requested| found.iter().all(|job| job.id != *requested))
        .collect()
}

/// One target per job, or one per organization when combining.
fn build_targets(jobs: Vec<JobRef>, combine: bool) -> Vec<ReportTarget> {
    if !combine {
        return jobs.into_iter().map(ReportTarget::single).collect();
    }
    let mut by_organization: BTreeMap<OrganizationId, Vec<JobRef>> = BTreeMap::new();
    for job in jobs {
        by_organization.entry(job.organization_id).or_default().push(job);
    }
    by_organization
        .into_values()
        .filter_map(|group| ReportTarget::combined(group).ok())
        .collect()
}
