//! Temporary database lifecycle for `PostgreSQL` integration tests.

use candidacy_report::report::adapters::postgres::{PoolSettings, PostgresReportSource};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use eyre::WrapErr;
use rstest::fixture;
use std::time::Duration;
use uuid::Uuid;

/// Server URL used to create and drop test databases.
pub const TEST_DATABASE_URL_VAR: &str = "REPORT_TEST_DATABASE_URL";

/// SQL creating the hiring tables.
pub const SCHEMA_SQL: &str = include_str!("../fixtures/report_schema.sql");

/// SQL seeding the hiring tables.
pub const SEED_SQL: &str = include_str!("../fixtures/report_seed.sql");

/// A seeded database dropped on drop.
pub struct TemporaryDatabase {
    admin_url: String,
    name: String,
    url: String,
}

impl TemporaryDatabase {
    /// Creates and seeds a database, or returns `None` when no server is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be created or seeded.
    pub fn create() -> eyre::Result<Option<Self>> {
        let Ok(admin_url) = std::env::var(TEST_DATABASE_URL_VAR) else {
            return Ok(None);
        };
        let name = format!("report_test_{}", Uuid::new_v4().simple());
        let mut admin =
            PgConnection::establish(&admin_url).wrap_err("connect to the test server")?;
        admin
            .batch_execute(&format!("CREATE DATABASE \"{name}\""))
            .wrap_err_with(|| format!("create database {name}"))?;

        let database = Self {
            url: database_url(&admin_url, &name),
            admin_url,
            name,
        };
        let mut connection = PgConnection::establish(&database.url)
            .wrap_err("connect to the test database")?;
        connection
            .batch_execute(SCHEMA_SQL)
            .wrap_err("apply report schema")?;
        connection.batch_execute(SEED_SQL).wrap_err("seed report data")?;
        Ok(Some(database))
    }

    /// Pool settings for the temporary database.
    pub fn settings(&self) -> PoolSettings {
        PoolSettings {
            min_idle: 0,
            max_size: 4,
            acquire_timeout: Duration::from_secs(5),
            ..PoolSettings::new(self.url.clone())
        }
    }

    /// Runs a statement against the temporary database.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection or statement fails.
    pub fn execute(&self, sql: &str) -> eyre::Result<()> {
        let mut connection = PgConnection::establish(&self.url)?;
        connection
            .batch_execute(sql)
            .wrap_err_with(|| format!("execute {sql}"))
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        if let Ok(mut admin) = PgConnection::establish(&self.admin_url) {
            admin
                .batch_execute(&format!(
                    "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
                    self.name
                ))
                .ok();
        }
    }
}

/// Replaces the database name of `admin_url`, keeping any query string.
fn database_url(admin_url: &str, name: &str) -> String {
    let (base, query) = admin_url
        .split_once('?')
        .map_or((admin_url, None), |(base, query)| (base, Some(query)));
    let server = base
        .rsplit_once('/')
        .map_or(base, |(server, _)| server);
    match query {
        Some(params) => format!("{server}/{name}?{params}"),
        None => format!("{server}/{name}"),
    }
}

/// Seeded database plus a source connected to it.
pub struct SeededSource {
    /// Keeps the database alive for the test.
    pub database: TemporaryDatabase,
    /// Source under test.
    pub source: PostgresReportSource,
}

/// Creates a seeded database and connects a source, or `None` without a
/// configured server.
#[fixture]
pub fn seeded_source() -> Option<SeededSource> {
    let database = TemporaryDatabase::create().expect("create test database")?;
    let source = PostgresReportSource::connect(&database.settings()).expect("connect source");
    Some(SeededSource { database, source })
}

#[rstest::rstest]
#[case("postgres://u:p@host:5432/postgres", "postgres://u:p@host:5432/t1")]
#[case("postgres://host/db?sslmode=disable", "postgres://host/t1?sslmode=disable")]
fn database_name_is_replaced(#[case] admin: &str, #[case] expected: &str) {
    assert_eq!(database_url(admin, "t1"), expected);
}
