//! Application services for report compilation.

mod assembler;
mod error;
mod orchestrator;
mod resolver;

pub use assembler::{
    AssembledRows, AssemblySettings, LookupFailure, RowAssembler, RowFailure, RowLookup,
    TAG_SEPARATOR,
};
pub use error::{ReportError, ReportResult};
pub use orchestrator::{
    JobOutcome, RUN_SUMMARY_FILE, ReportOrchestrator, RunRequest, RunSummary, TargetOutcome,
    TargetStatus,
};
pub use resolver::SchemaResolver;
