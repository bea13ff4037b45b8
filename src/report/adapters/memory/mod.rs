//! In-memory adapters for report extraction.

mod source;

pub use source::InMemoryReportSource;
