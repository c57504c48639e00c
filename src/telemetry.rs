//! Telemetry logic.
//! Support logging through `tracing`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

const DEFAULT_FILTER: &str = "info";

/// Build the log filter from `RUST_LOG`, `info` if unset.
pub fn filter() -> Result<EnvFilter, ParseError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => EnvFilter::try_new(DEFAULT_FILTER),
    }
}

/// Install the global subscriber printing to stderr.
///
/// Stdout is left to command output such as printed codes.
pub fn setup_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>>
{
    tracing_subscriber::fmt()
        .with_env_filter(filter()?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}
