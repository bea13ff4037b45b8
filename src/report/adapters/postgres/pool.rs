//! Bounded `PostgreSQL` connection pool.
//!
//! Connections are handed out as r2d2 guards and go back to the pool when
//! the guard drops, so every exit path of a lookup releases its
//! connection.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use std::fmt;
use std::time::Duration;

/// `PostgreSQL` connection pool type used by report adapters.
pub type ReportPgPool = Pool<ConnectionManager<PgConnection>>;

/// Sizing and timeouts for the report connection pool.
#[derive(Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Connection URL, including credentials.
    pub database_url: String,
    /// Idle connections kept open.
    pub min_idle: u32,
    /// Upper bound on open connections.
    pub max_size: u32,
    /// How long an acquire may wait before failing.
    pub acquire_timeout: Duration,
    /// Server-side limit applied to every statement.
    pub statement_timeout: Duration,
}

impl PoolSettings {
    /// Creates settings with the default sizing for `database_url`.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            min_idle: 1,
            max_size: 8,
            acquire_timeout: Duration::from_secs(30),
            statement_timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for PoolSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolSettings")
            .field("database_url", &"<redacted>")
            .field("min_idle", &self.min_idle)
            .field("max_size", &self.max_size)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .finish()
    }
}

/// Builds the pool and opens its idle connections.
///
/// # Errors
///
/// Returns [`PoolError`] when the initial connections cannot be
/// established.
pub fn build_pool(settings: &PoolSettings) -> Result<ReportPgPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(settings.database_url.as_str());
    Pool::builder()
        .min_idle(Some(settings.min_idle))
        .max_size(settings.max_size)
        .connection_timeout(settings.acquire_timeout)
        .test_on_check_out(true)
        .build(manager)
}
