//! Read-only query execution on pooled connections.
//!
//! Diesel is synchronous, so each query runs on Tokio's blocking pool. The
//! closure receives a connection inside a `READ ONLY` transaction with the
//! statement timeout already applied.

use super::pool::ReportPgPool;
use crate::report::ports::{SourceError, SourceResult};
use diesel::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use std::time::Duration;

/// Runs read queries against the report pool.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: ReportPgPool,
    statement_timeout_ms: String,
}

impl QueryExecutor {
    /// Creates an executor over `pool`.
    #[must_use]
    pub fn new(pool: ReportPgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout_ms: statement_timeout.as_millis().to_string(),
        }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &ReportPgPool {
        &self.pool
    }

    /// Acquires a connection, runs `query` in a read-only transaction and
    /// releases the connection.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ConnectionExhausted`] when no connection is
    /// available within the pool's acquire timeout, and
    /// [`SourceError::QueryFailed`] when the query fails or exceeds the
    /// statement timeout.
    pub async fn run<F, T>(&self, query: F) -> SourceResult<T>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let timeout_ms = self.statement_timeout_ms.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(SourceError::exhausted)?;
            connection
                .build_transaction()
                .read_only()
                .run(|tx| {
                    apply_statement_timeout(tx, &timeout_ms)?;
                    query(tx)
                })
                .map_err(SourceError::query)
        })
        .await
        .map_err(SourceError::query)?
    }
}

/// Scopes `statement_timeout` to the current transaction.
fn apply_statement_timeout(connection: &mut PgConnection, timeout_ms: &str) -> QueryResult<()> {
    diesel::sql_query("SELECT set_config('statement_timeout', $1, true)")
        .bind::<Text, _>(timeout_ms.to_owned())
        .execute(connection)
        .map(|_| ())
}
