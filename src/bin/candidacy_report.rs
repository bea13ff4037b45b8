//! Compiles candidacy CSV reports from the hiring database.
//!
//! Usage:
//!
//! ```text
//! candidacy_report [--job <ID>]... [--organization <ID>]
//!                  [--since <YYYY-MM-DD> --until <YYYY-MM-DD> [--monthly]]
//!                  [--combine] [--append] [--output-dir <DIR>]
//! ```
//!
//! Connection and pool settings come from `REPORT_*` environment variables
//! (see [`candidacy_report::config`]). Every run that gets through its
//! jobs writes `run-summary.json` into the output directory and exits
//! non-zero when any report failed. An exhausted connection pool ends the
//! run with an error and no summary.

use camino::Utf8PathBuf;
use candidacy_report::config::ReportConfig;
use candidacy_report::report::{
    adapters::{
        csv_writer::{ReportDestination, WriteMode},
        postgres::PostgresReportSource,
    },
    domain::{DateRange, JobFilter, JobId, OrganizationId},
    services::{ReportOrchestrator, RunRequest},
};
use candidacy_report::telemetry;
use chrono::NaiveDate;
use clap::Parser;
use mockable::DefaultClock;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Builder;
use tracing::{error, info};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(
    name = "candidacy_report",
    about = "Compile one CSV report per job from the hiring database",
    version
)]
struct Cli {
    /// Job to report on; repeat for several jobs (defaults to all jobs)
    #[arg(long = "job", value_name = "ID")]
    jobs: Vec<i64>,
    /// Only report jobs of this organization
    #[arg(long, value_name = "ID")]
    organization: Option<i64>,
    /// First day of candidacy creation to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, requires = "until")]
    since: Option<NaiveDate>,
    /// Last day of candidacy creation to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, requires = "since")]
    until: Option<NaiveDate>,
    /// Write one report per calendar month of the date range
    #[arg(long, requires = "since")]
    monthly: bool,
    /// Write one combined report per organization instead of one per job
    #[arg(long)]
    combine: bool,
    /// Append rows to existing reports instead of replacing them
    #[arg(long)]
    append: bool,
    /// Override the configured output directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<Utf8PathBuf>,
}

impl Cli {
    fn run_request(&self) -> Result<RunRequest, BoxError> {
        let candidacies_created = match (self.since, self.until) {
            (Some(first), Some(last)) => Some(DateRange::from_days(first, last)?),
            _ => None,
        };
        Ok(RunRequest {
            filter: JobFilter {
                organization_id: self.organization.map(OrganizationId::new),
                job_ids: self.jobs.iter().copied().map(JobId::new).collect(),
                candidacies_created,
            },
            combine: self.combine,
            monthly: self.monthly,
        })
    }

    const fn write_mode(&self) -> WriteMode {
        if self.append {
            WriteMode::Append
        } else {
            WriteMode::Overwrite
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();
    let mut config = ReportConfig::load()?;
    if let Some(dir) = cli.output_dir.clone() {
        config.output_dir = dir;
    }
    telemetry::init(&config.log_level)?;

    let request = cli.run_request()?;
    let source = PostgresReportSource::connect(&config.pool)?;
    info!(
        pool = ?config.pool,
        workers = config.assembly.workers.get(),
        "connected to report database"
    );

    let orchestrator = ReportOrchestrator::new(
        Arc::new(source),
        Arc::new(DefaultClock),
        config.assembly,
        ReportDestination::new(config.output_dir.clone()),
    )
    .with_mode(cli.write_mode());

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let summary = runtime.block_on(orchestrator.run(&request))?;
    let summary_path = orchestrator.write_summary(&summary)?;

    if summary.is_success() {
        info!(path = %summary_path, targets = summary.targets.len(), "all reports written");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            path = %summary_path,
            failed_targets = summary.failed_targets(),
            "some reports failed"
        );
        Ok(ExitCode::FAILURE)
    }
}
