//! Service-level errors for report compilation.

use crate::report::{
    adapters::csv_writer::ReportWriteError,
    domain::{JobId, ReportDomainError},
    ports::SourceError,
};
use thiserror::Error;

/// Errors that abort a report before its file is written.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No database connection could be acquired.
    #[error(transparent)]
    ConnectionExhausted(SourceError),

    /// A query needed for the whole report failed.
    #[error(transparent)]
    QueryFailed(SourceError),

    /// Requested jobs do not exist or belong to no organization.
    #[error("jobs not found: {jobs:?}")]
    JobNotFound {
        /// Requested jobs.
        jobs: Vec<JobId>,
    },

    /// The column layout cannot be built unambiguously.
    #[error(transparent)]
    SchemaAmbiguity(#[from] ReportDomainError),

    /// The report file could not be written.
    #[error(transparent)]
    Write(#[from] ReportWriteError),

    /// A row task panicked or was cancelled.
    #[error("row worker failed: {0}")]
    WorkerPanicked(#[source] tokio::task::JoinError),

    /// The run summary could not be encoded.
    #[error("failed to encode run summary: {0}")]
    Summary(#[source] serde_json::Error),
}

impl From<SourceError> for ReportError {
    fn from(err: SourceError) -> Self {
        if err.is_fatal() {
            Self::ConnectionExhausted(err)
        } else {
            Self::QueryFailed(err)
        }
    }
}

impl ReportError {
    /// Short machine-readable name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionExhausted(_) => "connection_exhausted",
            Self::QueryFailed(_) => "query_failed",
            Self::JobNotFound { .. } => "job_not_found",
            Self::SchemaAmbiguity(_) => "schema_ambiguity",
            Self::Write(_) => "write",
            Self::WorkerPanicked(_) => "worker_panicked",
            Self::Summary(_) => "summary",
        }
    }
}

/// Result type for report services.
pub type ReportResult<T> = Result<T, ReportError>;
