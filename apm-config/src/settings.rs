//! SDK-level settings.

use anyhow::Context;
use apm_primitives::Error;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::options::{EnvOptions, OptionSource};

const KEY_APPLICATION_NAME: &str = "apm.application_name";
const KEY_LICENSE: &str = "apm.license";
const KEY_CAPTURE_URL_PARAMETERS: &str = "apm.capture_url_parameters";
const KEY_LOG_FILTER: &str = "apm.log";

/// Settings applied by the host application on top of the backend's own
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApmConfig {
    /// Application name overriding the backend's configured one.
    pub application_name: Option<String>,
    /// Backend license / API key overriding the backend's configured one.
    pub license: Option<String>,
    /// Whether URL parameters are captured on web transactions.
    pub capture_url_parameters: bool,
    /// `tracing` filter directive for the client's own diagnostics.
    pub log_filter: String,
}

impl Default for ApmConfig {
    fn default() -> Self {
        Self {
            application_name: None,
            license: None,
            capture_url_parameters: false,
            log_filter: "info".to_owned(),
        }
    }
}

impl ApmConfig {
    /// Reads settings from `source` using `apm.*` keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the resulting settings fail
    /// [`ApmConfig::validate`].
    pub fn from_source(source: &dyn OptionSource) -> apm_primitives::Result<Self> {
        let defaults = Self::default();
        let config = Self {
            application_name: source.option(KEY_APPLICATION_NAME),
            license: source.option(KEY_LICENSE),
            capture_url_parameters: source
                .option(KEY_CAPTURE_URL_PARAMETERS)
                .map_or(defaults.capture_url_parameters, |value| parse_flag(&value)),
            log_filter: source
                .option(KEY_LOG_FILTER)
                .map_or(defaults.log_filter, |value| value.to_lowercase()),
        };

        config.validate()?;
        debug!(
            application_name = ?config.application_name,
            capture_url_parameters = config.capture_url_parameters,
            "loaded apm configuration"
        );
        Ok(config)
    }

    /// Reads settings from `APM_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`ApmConfig::from_source`].
    pub fn from_env() -> apm_primitives::Result<Self> {
        Self::from_source(&EnvOptions::new())
    }

    /// Parses settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be deserialised or fails
    /// validation.
    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(input).context("invalid apm configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when an override is present but blank,
    /// or when the log filter is empty.
    pub fn validate(&self) -> apm_primitives::Result<()> {
        if self
            .application_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(Error::invalid_argument("application name cannot be blank"));
        }

        if self
            .license
            .as_deref()
            .is_some_and(|license| license.trim().is_empty())
        {
            return Err(Error::invalid_argument("license cannot be blank"));
        }

        if self.log_filter.trim().is_empty() {
            return Err(Error::invalid_argument("log filter cannot be empty"));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
