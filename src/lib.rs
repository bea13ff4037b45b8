//! Candidacy report compiler.
//!
//! Reads a snapshot of the hiring database and writes one denormalized CSV
//! report per job: a fixed block of candidacy and applicant columns, then
//! column groups discovered per job for pipeline assessments, assessments
//! taken outside the pipeline, their scoring dimensions and the
//! organization's custom fields.
//!
//! # Architecture
//!
//! The report module follows hexagonal architecture principles:
//!
//! - **Domain**: ids, source records, the report schema and rows
//! - **Ports**: the read-only [`report::ports::ReportSource`] contract
//! - **Adapters**: `PostgreSQL` and in-memory sources, the CSV destination
//! - **Services**: schema resolution, row assembly and job orchestration
//!
//! # Modules
//!
//! - [`report`]: report compilation
//! - [`config`]: environment configuration for binaries
//! - [`telemetry`]: tracing subscriber setup for binaries

pub mod config;
pub mod report;
pub mod telemetry;
