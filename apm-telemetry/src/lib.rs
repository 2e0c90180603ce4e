//! Observability utilities for the APM client itself.
//!
//! Agents report informational notices (agent not initialised, failed renames,
//! unavailable backend operations) through a [`LogSink`]. The sink is swappable
//! after construction; agents start with a [`DiscardSink`] so nothing logged
//! while an agent initialises can escape.

#![warn(missing_docs, clippy::pedantic)]

mod sink;

pub use sink::{CollectingSink, DiscardSink, LogSink, TracingSink};

use anyhow::{Context, anyhow};
use tracing_subscriber::EnvFilter;

/// Environment variable consulted by [`filter_from_env`].
pub const LOG_FILTER_ENV: &str = "APM_LOG";

/// Filter used when no explicit filter is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Returns the log filter configured through [`LOG_FILTER_ENV`], falling back
/// to [`DEFAULT_LOG_FILTER`].
#[must_use]
pub fn filter_from_env() -> String {
    std::env::var(LOG_FILTER_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned())
}

/// Installs a global `fmt` subscriber filtered by `filter`.
///
/// # Errors
///
/// Returns an error when the filter directive cannot be parsed or a global
/// subscriber has already been installed.
pub fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_new(filter).with_context(|| format!("invalid log filter `{filter}`"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
