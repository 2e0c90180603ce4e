//! No-op agent.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use apm_backend::NoBackend;
use apm_primitives::{Datastore, Result, SegmentQuery};
use apm_telemetry::LogSink;
use serde_json::{Map, Value};

use crate::agent::Agent;
use crate::lifecycle::AgentCore;
use crate::transaction::Transaction;

/// Placeholder returned as browser header script.
pub const NULL_HEADER_SCRIPT: &str = "<!-- NullAgent - header.js -->";

/// Placeholder returned as browser footer script.
pub const NULL_FOOTER_SCRIPT: &str = "<!-- NullAgent - footer.js -->";

/// [`Agent`] that records nothing.
///
/// Always initialised. Mutators do nothing, accessors return fixed values
/// (transactions are always sampled) and only the ended flag follows
/// [`Agent::start_transaction`] and [`Agent::end_transaction`].
#[derive(Debug)]
pub struct NullAgent {
    core: AgentCore,
    transaction_ended: AtomicBool,
}

impl Default for NullAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl NullAgent {
    /// Creates the agent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: AgentCore::initialised(Arc::new(NoBackend)),
            transaction_ended: AtomicBool::new(false),
        }
    }

    /// Replaces the logger sink.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.core.set_logger(logger);
        self
    }
}

impl Agent for NullAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn change_application_name(&self, _name: &str, _ignore_transaction: bool) {}

    fn capture_url_parameters(&self, _enable: bool) {}

    fn record_custom_event(&self, _name: &str, _attributes: &Map<String, Value>) -> Result<()> {
        Ok(())
    }

    fn add_custom_metric(&self, _name: &str, _milliseconds: f64) -> Result<()> {
        Ok(())
    }

    fn disable_automatic_browser_monitoring_scripts(&self) {}

    fn get_browser_monitoring_header_script(&self) -> String {
        NULL_HEADER_SCRIPT.to_owned()
    }

    fn get_browser_monitoring_footer_script(&self) -> String {
        NULL_FOOTER_SCRIPT.to_owned()
    }

    fn start_transaction(&self, _ignore_previous: bool) -> Transaction<'_> {
        self.transaction_ended.store(false, Ordering::SeqCst);
        self.create_transaction(self)
    }

    fn change_transaction_name(&self, _name: &str) {}

    fn add_transaction_parameter(&self, _name: &str, _value: &Value) -> Result<()> {
        Ok(())
    }

    fn mark_transaction_as_background(&self, _background: bool) {}

    fn record_transaction_exception(&self, _message: &str, _error: &dyn std::error::Error) {}

    fn add_transaction_datastore_segment(
        &self,
        _datastore: &Datastore,
        _query: &SegmentQuery,
        _work: &mut dyn FnMut(),
    ) {
    }

    fn stop_transaction_timing(&self) {}

    fn ignore_transaction_apdex(&self) {}

    fn ignore_transaction(&self) {}

    fn is_transaction_sampled(&self) -> bool {
        true
    }

    fn end_transaction(&self) {
        self.transaction_ended.store(true, Ordering::SeqCst);
    }

    fn is_transaction_ended(&self) -> bool {
        self.transaction_ended.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use apm_telemetry::CollectingSink;
    use serde_json::json;

    use crate::AgentExt;

    #[test]
    fn always_supported_and_silent() {
        let sink = Arc::new(CollectingSink::new());
        let agent = NullAgent::new().with_logger(sink.clone());

        assert!(agent.is_supported());
        agent.change_application_name("App", true);
        agent.capture_url_parameters(true);
        agent.record_custom_event("type", &Map::new()).expect("event");
        agent.add_custom_metric("type", 1.0).expect("metric");
        agent.add_transaction_parameter("type", &json!([1])).expect("parameter");
        agent.disable_automatic_browser_monitoring_scripts();

        assert!(sink.is_empty());
    }

    #[test]
    fn fixed_accessors() {
        let agent = NullAgent::default();
        assert_eq!(agent.get_browser_monitoring_header_script(), NULL_HEADER_SCRIPT);
        assert_eq!(agent.get_browser_monitoring_footer_script(), NULL_FOOTER_SCRIPT);
        assert!(agent.is_transaction_sampled());
        assert!(!agent.is_reserved_word("type"));
    }

    #[test]
    fn ended_flag_follows_local_calls() {
        let agent = NullAgent::new();
        assert!(!agent.is_transaction_ended());

        agent.end_transaction();
        assert!(agent.is_transaction_ended());

        let transaction = agent.start_transaction(true);
        assert!(!transaction.is_ended());
    }

    #[test]
    fn datastore_work_runs_inline() {
        let agent = NullAgent::new();
        let datastore = Datastore::new("Redis", "0", "get");

        let value = agent.datastore_segment(&datastore, &SegmentQuery::new(), || Some(42));
        assert_eq!(value, Some(42));
    }

    #[test]
    fn unknown_operations_are_neutral() {
        let agent = NullAgent::new();
        assert_eq!(agent.call("newrelic_get_trace_metadata", Vec::new()), json!(false));
    }
}
