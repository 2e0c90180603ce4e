//! Facades grouping agent capabilities by concern.

use std::fmt;
use std::sync::Arc;

use apm_config::ApmConfig;
use tracing::debug;

use crate::agent::Agent;
use crate::null::NullAgent;
use crate::transaction::Transaction;

/// Entry point for application code.
#[derive(Clone)]
pub struct Client {
    agent: Arc<dyn Agent>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("supported", &self.agent.is_supported())
            .finish()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Arc::new(NullAgent::new()))
    }
}

impl Client {
    /// Creates a client over `agent`.
    #[must_use]
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self { agent }
    }

    /// Returns the agent.
    #[must_use]
    pub fn agent(&self) -> &dyn Agent {
        self.agent.as_ref()
    }

    /// Applies the application name override and URL parameter capture from
    /// `config`.
    pub fn configure(&self, config: &ApmConfig) {
        if let Some(name) = &config.application_name {
            self.agent.change_application_name(name, true);
        }
        self.agent
            .capture_url_parameters(config.capture_url_parameters);
        debug!(
            application_name = ?config.application_name,
            capture_url_parameters = config.capture_url_parameters,
            "client configured"
        );
    }

    /// Browser timing facade.
    #[must_use]
    pub fn browser(&self) -> Browser<'_> {
        Browser::new(self.agent.as_ref())
    }

    /// Handle on the current transaction.
    #[must_use]
    pub fn transaction(&self) -> Transaction<'_> {
        Transaction::new(self.agent.as_ref())
    }

    /// Ends the current transaction and starts a new one.
    #[must_use = "the returned handle tracks the new transaction"]
    pub fn start_transaction(&self, ignore_previous: bool) -> Transaction<'_> {
        self.transaction().start(ignore_previous)
    }
}

/// Browser timing script access.
#[derive(Clone, Copy)]
pub struct Browser<'a> {
    agent: &'a dyn Agent,
}

impl fmt::Debug for Browser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser").finish_non_exhaustive()
    }
}

impl<'a> Browser<'a> {
    /// Creates the facade over `agent`.
    #[must_use]
    pub fn new(agent: &'a dyn Agent) -> Self {
        Self { agent }
    }

    /// Stops the backend from injecting timing scripts itself.
    pub fn disable_automatic_timing_scripts(&self) {
        self.agent.disable_automatic_browser_monitoring_scripts();
    }

    /// Script to place in the page header.
    #[must_use]
    pub fn header_script(&self) -> String {
        self.agent.get_browser_monitoring_header_script()
    }

    /// Script to place before the closing body tag.
    #[must_use]
    pub fn footer_script(&self) -> String {
        self.agent.get_browser_monitoring_footer_script()
    }
}
