//! Port contracts for report compilation.
//!
//! Ports define infrastructure-agnostic interfaces used by report services.

pub mod source;

pub use source::{ReportSource, SourceError, SourceResult};
