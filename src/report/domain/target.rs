//! Report targets: the job or job set one output file covers.

use super::{DateRange, JobId, JobRef, OrganizationId, ReportDomainError, slugify};

/// The jobs, candidacy range and output file stem of one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTarget {
    jobs: Vec<JobRef>,
    candidacies_created: Option<DateRange>,
}

impl ReportTarget {
    /// Creates a target for a single job.
    #[must_use]
    pub fn single(job: JobRef) -> Self {
        Self {
            jobs: vec![job],
            candidacies_created: None,
        }
    }

    /// Creates a target spanning several jobs reported in one file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportDomainError::EmptyTarget`] when `jobs` is empty and
    /// [`ReportDomainError::MixedOrganizations`] when the jobs belong to
    /// different organizations.
    pub fn combined(jobs: Vec<JobRef>) -> Result<Self, ReportDomainError> {
        let Some(first) = jobs.first() else {
            return Err(ReportDomainError::EmptyTarget);
        };
        let organization_id = first.organization_id;
        if jobs.iter().any(|job| job.organization_id != organization_id) {
            let mut organizations: Vec<OrganizationId> =
                jobs.iter().map(|job| job.organization_id).collect();
            organizations.sort_unstable();
            organizations.dedup();
            return Err(ReportDomainError::MixedOrganizations {
                jobs: jobs.iter().map(|job| job.id).collect(),
                organizations,
            });
        }
        Ok(Self {
            jobs,
            candidacies_created: None,
        })
    }

    /// Restricts the report to candidacies created within `range`.
    #[must_use]
    pub const fn with_created_within(mut self, range: DateRange) -> Self {
        self.candidacies_created = Some(range);
        self
    }

    /// Jobs covered, in request order.
    #[must_use]
    pub fn jobs(&self) -> &[JobRef] {
        &self.jobs
    }

    /// Ids of the jobs covered.
    #[must_use]
    pub fn job_ids(&self) -> Vec<JobId> {
        self.jobs.iter().map(|job| job.id).collect()
    }

    /// Candidacy creation filter, if any.
    #[must_use]
    pub const fn candidacies_created(&self) -> Option<DateRange> {
        self.candidacies_created
    }

    /// Organization owning the jobs, as known to the caller.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.jobs.first().map(|job| job.organization_id)
    }

    /// Name of a covered job.
    #[must_use]
    pub fn job_name(&self, job_id: JobId) -> Option<&str> {
        self.jobs
            .iter()
            .find(|job| job.id == job_id)
            .map(|job| job.name.as_str())
    }

    /// File name without extension: `{id}_{slug}` for one job, or
    /// `jobs_{id}_{id}...` for a job set.
    #[must_use]
    pub fn file_stem(&self) -> String {
        match self.jobs.as_slice() {
            [job] => {
                let slug = slugify(&job.name).replace(['/', '\\'], "_");
                if slug.is_empty() {
                    job.id.to_string()
                } else {
                    format!("{}_{slug}", job.id)
                }
            }
            jobs => {
                let ids: Vec<String> = jobs.iter().map(|job| job.id.to_string()).collect();
                format!("jobs_{}", ids.join("_"))
            }
        }
    }
}
