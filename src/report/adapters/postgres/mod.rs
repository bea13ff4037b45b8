//! `PostgreSQL` adapters for report extraction.

mod executor;
mod models;
mod pool;
mod queries;
mod source;

pub use executor::QueryExecutor;
pub use pool::{PoolSettings, ReportPgPool, build_pool};
pub use source::PostgresReportSource;
