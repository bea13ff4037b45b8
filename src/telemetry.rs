//! Tracing subscriber setup for the report binary.
//!
//! The library never installs a subscriber; binaries call [`init`] once at
//! start-up with the configured fallback level.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Variable whose directive overrides the configured level.
pub const LOG_FILTER_VAR: &str = "RUST_LOG";

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The fallback level is not a valid filter directive.
    #[error("invalid log level '{level}'")]
    InvalidLevel {
        /// Rejected directive.
        level: String,
        /// Parse failure.
        #[source]
        source: ParseError,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Picks the log filter: a parseable `directive` wins, otherwise `level`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidLevel`] when `directive` is absent or
/// unparseable and `level` does not parse either.
pub fn log_filter(directive: Option<&str>, level: &str) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = directive.and_then(|raw| EnvFilter::try_new(raw).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|source| TelemetryError::InvalidLevel {
        level: level.to_owned(),
        source,
    })
}

/// Installs a compact `fmt` subscriber writing to stderr, so report output
/// and logs never share a stream.
///
/// # Errors
///
/// Returns [`TelemetryError`] when no usable filter can be built or a
/// subscriber is already installed.
pub fn init(level: &str) -> Result<(), TelemetryError> {
    let directive = std::env::var(LOG_FILTER_VAR).ok();
    let filter = log_filter(directive.as_deref(), level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
