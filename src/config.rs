//! Environment configuration for the report binary.
//!
//! Values come from `REPORT_*` environment variables, optionally seeded from
//! a `.env` file. Parsing goes through [`ReportConfig::from_lookup`] so it
//! can be exercised without touching the process environment.

use crate::report::{adapters::postgres::PoolSettings, services::AssemblySettings};
use camino::Utf8PathBuf;
use std::env;
use std::num::{NonZeroUsize, ParseIntError};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Full connection URL; overrides the individual `REPORT_DB_*` parts.
pub const DATABASE_URL_VAR: &str = "REPORT_DATABASE_URL";
const DB_HOST_VAR: &str = "REPORT_DB_HOST";
const DB_PORT_VAR: &str = "REPORT_DB_PORT";
const DB_USER_VAR: &str = "REPORT_DB_USER";
const DB_PASSWORD_VAR: &str = "REPORT_DB_PASSWORD";
const DB_NAME_VAR: &str = "REPORT_DB_NAME";
const POOL_MIN_IDLE_VAR: &str = "REPORT_POOL_MIN_IDLE";
const POOL_MAX_SIZE_VAR: &str = "REPORT_POOL_MAX_SIZE";
const POOL_TIMEOUT_VAR: &str = "REPORT_POOL_TIMEOUT_SECS";
const STATEMENT_TIMEOUT_VAR: &str = "REPORT_STATEMENT_TIMEOUT_MS";
const WORKERS_VAR: &str = "REPORT_WORKERS";
const OUTPUT_DIR_VAR: &str = "REPORT_OUTPUT_DIR";
const LOG_LEVEL_VAR: &str = "REPORT_LOG_LEVEL";

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric variable did not parse.
    #[error("{variable} must be a non-negative integer, got '{value}': {source}")]
    InvalidNumber {
        /// Variable name.
        variable: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        #[source]
        source: ParseIntError,
    },

    /// A variable that must be positive was zero.
    #[error("{variable} must be greater than zero")]
    Zero {
        /// Variable name.
        variable: &'static str,
    },

    /// The pool would keep more idle connections than it may open.
    #[error("pool min idle ({min_idle}) exceeds max size ({max_size})")]
    PoolBounds {
        /// Requested idle connections.
        min_idle: u32,
        /// Requested upper bound.
        max_size: u32,
    },
}

/// Top-level configuration of a report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Connection pool sizing and timeouts.
    pub pool: PoolSettings,
    /// Row assembly concurrency.
    pub assembly: AssemblySettings,
    /// Root directory for report files.
    pub output_dir: Utf8PathBuf,
    /// Log level used when `RUST_LOG` is unset or unparseable.
    pub log_level: String,
}

impl ReportConfig {
    /// Loads configuration from the process environment, after applying
    /// any `.env` file in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds an invalid value.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Lookup(lookup);
        let database_url = match vars.text(DATABASE_URL_VAR) {
            Some(url) => url,
            None => database_url_from_parts(&vars)?,
        };

        let min_idle = vars.number(POOL_MIN_IDLE_VAR, 1_u32)?;
        let max_size = vars.number(POOL_MAX_SIZE_VAR, 8_u32)?;
        if max_size == 0 {
            return Err(ConfigError::Zero {
                variable: POOL_MAX_SIZE_VAR,
            });
        }
        if min_idle > max_size {
            return Err(ConfigError::PoolBounds { min_idle, max_size });
        }
        let acquire_timeout = Duration::from_secs(vars.number(POOL_TIMEOUT_VAR, 30_u64)?);
        let statement_timeout =
            Duration::from_millis(vars.number(STATEMENT_TIMEOUT_VAR, 30_000_u64)?);

        let assembly = match vars.text(WORKERS_VAR) {
            Some(_) => {
                let workers = vars.number(WORKERS_VAR, 0_usize)?;
                let positive = NonZeroUsize::new(workers).ok_or(ConfigError::Zero {
                    variable: WORKERS_VAR,
                })?;
                AssemblySettings::new(positive)
            }
            None => AssemblySettings::default(),
        };

        Ok(Self {
            pool: PoolSettings {
                database_url,
                min_idle,
                max_size,
                acquire_timeout,
                statement_timeout,
            },
            assembly,
            output_dir: Utf8PathBuf::from(
                vars.text(OUTPUT_DIR_VAR).unwrap_or_else(|| "reports".to_owned()),
            ),
            log_level: vars.text(LOG_LEVEL_VAR).unwrap_or_else(|| "info".to_owned()),
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed, non-empty value of `name`.
    fn text(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn number<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr<Err = ParseIntError>,
    {
        self.text(name).map_or(Ok(default), |raw| {
            raw.parse().map_err(|source| ConfigError::InvalidNumber {
                variable: name,
                value: raw,
                source,
            })
        })
    }
}

fn database_url_from_parts<F>(vars: &Lookup<F>) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = vars.text(DB_HOST_VAR).unwrap_or_else(|| "localhost".to_owned());
    let port = vars.number(DB_PORT_VAR, 5432_u16)?;
    let user = vars.text(DB_USER_VAR).unwrap_or_else(|| "postgres".to_owned());
    let name = vars.text(DB_NAME_VAR).unwrap_or_else(|| "postgres".to_owned());
    let credentials = match vars.text(DB_PASSWORD_VAR) {
        Some(password) => format!("{user}:{password}"),
        None => user,
    };
    Ok(format!("postgres://{credentials}@{host}:{port}/{name}"))
}
