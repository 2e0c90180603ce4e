//! Agent backed by the New Relic instrumentation extension.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use apm_backend::{Argument, BackendCapability};
use apm_config::{ApmConfig, MapOptions};
use apm_primitives::{Datastore, Result, SegmentQuery, ensure_scalar, is_truthy};
use apm_telemetry::LogSink;
use serde_json::{Map, Value};
use tracing::debug;

use crate::agent::Agent;
use crate::lifecycle::AgentCore;
use crate::transaction::Transaction;

/// Backend option holding the application name.
pub const APP_NAME_OPTION: &str = "newrelic.appname";

/// Backend option holding the license key.
pub const LICENSE_OPTION: &str = "newrelic.license";

/// Names the backend uses internally for event attributes.
pub const RESERVED_WORDS: [&str; 5] = ["accountId", "appId", "timestamp", "type", "eventType"];

const IGNORE_TRANSACTION_ON_END: bool = false;
const CUSTOM_METRIC_PREFIX: &str = "Custom/";

/// [`Agent`] driving the New Relic extension through a [`BackendCapability`].
///
/// The agent is supported when the backend is available and both the
/// application name and license options are set.
#[derive(Debug)]
pub struct NewRelicAgent {
    core: AgentCore,
    application_name: String,
    license: String,
    transaction_ended: AtomicBool,
    transaction_ignored: AtomicBool,
}

impl NewRelicAgent {
    /// Creates the agent and runs initialisation against `backend`.
    ///
    /// # Errors
    ///
    /// Initialisation never refuses, so this only fails if that changes; an
    /// unusable backend yields an unsupported agent instead.
    pub fn new(backend: Arc<dyn BackendCapability>) -> Result<Self> {
        let mut application_name = String::new();
        let mut license = String::new();

        let core = AgentCore::bootstrap(backend, |core| {
            if !core.backend().is_available() {
                return Ok(false);
            }

            core.reserve_words(RESERVED_WORDS);
            application_name = core.backend().option(APP_NAME_OPTION).unwrap_or_default();
            license = core.backend().option(LICENSE_OPTION).unwrap_or_default();

            Ok(!application_name.is_empty() && !license.is_empty())
        })?;

        Ok(Self {
            core,
            application_name,
            license,
            transaction_ended: AtomicBool::new(false),
            transaction_ignored: AtomicBool::new(false),
        })
    }

    /// Replaces the logger sink.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.core.set_logger(logger);
        self
    }

    /// Backend options derived from the overrides in `config`.
    #[must_use]
    pub fn options(config: &ApmConfig) -> MapOptions {
        let mut options = MapOptions::new();
        if let Some(name) = &config.application_name {
            options.insert(APP_NAME_OPTION, name.clone());
        }
        if let Some(license) = &config.license {
            options.insert(LICENSE_OPTION, license.clone());
        }
        options
    }

    /// Application name read during initialisation.
    #[must_use]
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Instruments the function named `function_name` with a custom tracer.
    #[must_use]
    pub fn add_custom_tracer(&self, function_name: &str) -> bool {
        is_truthy(&self.core.call("newrelic_add_custom_tracer", vec![function_name.into()]))
    }

    /// Attaches user, account and product attributes to browser traces.
    #[must_use]
    pub fn set_user_attributes(&self, user: &str, account: &str, product: &str) -> bool {
        is_truthy(&self.core.call(
            "newrelic_set_user_attributes",
            vec![user.into(), account.into(), product.into()],
        ))
    }

    /// Attaches a parameter to the current span.
    ///
    /// # Errors
    ///
    /// Same validation as [`Agent::add_transaction_parameter`].
    pub fn add_custom_span_parameter(&self, name: &str, value: &Value) -> Result<bool> {
        self.core.guard_is_not_reserved_word(name)?;
        ensure_scalar(value)?;

        Ok(is_truthy(&self.core.call(
            "newrelic_add_custom_span_parameter",
            vec![name.into(), value.clone().into()],
        )))
    }

    /// Metadata linking logs to the current trace; empty when unavailable.
    #[must_use]
    pub fn linking_metadata(&self) -> Map<String, Value> {
        match self.core.call("newrelic_get_linking_metadata", Vec::new()) {
            Value::Object(metadata) => metadata,
            _ => Map::new(),
        }
    }

    fn script(&self, operation: &str) -> String {
        match self.core.call(operation, vec![false.into()]) {
            Value::String(script) => script,
            _ => String::new(),
        }
    }
}

fn segment_parameters(datastore: &Datastore, query: &SegmentQuery) -> Map<String, Value> {
    [
        ("product", Some(datastore.product())),
        ("collection", datastore.collection()),
        ("operation", Some(datastore.operation())),
        ("host", datastore.host()),
        ("databaseName", Some(datastore.database())),
        ("query", query.query()),
        ("inputQueryLabel", query.input_query_label()),
        ("inputQuery", query.input_query()),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|value| (key.to_owned(), Value::from(value))))
    .collect()
}

impl Agent for NewRelicAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn change_application_name(&self, name: &str, ignore_transaction: bool) {
        self.core.call(
            "newrelic_set_appname",
            vec![name.into(), self.license.as_str().into(), (!ignore_transaction).into()],
        );
    }

    fn capture_url_parameters(&self, enable: bool) {
        self.core.call("newrelic_capture_params", vec![enable.into()]);
    }

    fn record_custom_event(&self, name: &str, attributes: &Map<String, Value>) -> Result<()> {
        self.core.guard_is_not_reserved_word(name)?;

        self.core.call(
            "newrelic_record_custom_event",
            vec![name.into(), Value::Object(attributes.clone()).into()],
        );
        Ok(())
    }

    fn add_custom_metric(&self, name: &str, milliseconds: f64) -> Result<()> {
        self.core.guard_is_not_reserved_word(name)?;

        self.core.call(
            "newrelic_custom_metric",
            vec![format!("{CUSTOM_METRIC_PREFIX}{name}").into(), milliseconds.into()],
        );
        Ok(())
    }

    fn disable_automatic_browser_monitoring_scripts(&self) {
        self.core.call("newrelic_disable_autorum", Vec::new());
    }

    fn get_browser_monitoring_header_script(&self) -> String {
        self.script("newrelic_get_browser_timing_header")
    }

    fn get_browser_monitoring_footer_script(&self) -> String {
        self.script("newrelic_get_browser_timing_footer")
    }

    fn start_transaction(&self, ignore_previous: bool) -> Transaction<'_> {
        if ignore_previous && self.is_supported() && !self.is_transaction_ended() {
            self.ignore_transaction();
        }

        let started = is_truthy(&self.core.call(
            "newrelic_start_transaction",
            vec![
                self.application_name.as_str().into(),
                self.license.as_str().into(),
            ],
        ));
        self.transaction_ended.store(!started, Ordering::SeqCst);
        self.transaction_ignored.store(false, Ordering::SeqCst);

        if !started && self.is_supported() {
            self.core.logger().info("[APM] Unable to start a new transaction.");
        }

        self.create_transaction(self)
    }

    fn change_transaction_name(&self, name: &str) {
        let renamed = is_truthy(&self.core.call("newrelic_name_transaction", vec![name.into()]));
        if !renamed && self.is_supported() {
            self.core
                .logger()
                .info("[APM] Unable to change current transaction name.");
        }
    }

    fn add_transaction_parameter(&self, name: &str, value: &Value) -> Result<()> {
        self.core.guard_is_not_reserved_word(name)?;
        ensure_scalar(value)?;

        self.core.call(
            "newrelic_add_custom_parameter",
            vec![name.into(), value.clone().into()],
        );
        Ok(())
    }

    fn mark_transaction_as_background(&self, background: bool) {
        self.core.call("newrelic_background_job", vec![background.into()]);
    }

    fn record_transaction_exception(&self, message: &str, error: &dyn std::error::Error) {
        self.core.call(
            "newrelic_notice_error",
            vec![message.into(), Argument::Error(error)],
        );
    }

    fn add_transaction_datastore_segment(
        &self,
        datastore: &Datastore,
        query: &SegmentQuery,
        work: &mut dyn FnMut(),
    ) {
        let parameters = segment_parameters(datastore, query);
        self.core.call(
            "newrelic_record_datastore_segment",
            vec![Argument::Callback(work), Value::Object(parameters).into()],
        );
    }

    fn stop_transaction_timing(&self) {
        self.core.call("newrelic_end_of_transaction", Vec::new());
    }

    fn ignore_transaction_apdex(&self) {
        if self.transaction_ignored.load(Ordering::SeqCst) {
            debug!("transaction already ignored, skipping apdex ignore");
            return;
        }

        self.core.call("newrelic_ignore_apdex", Vec::new());
    }

    fn ignore_transaction(&self) {
        self.core.call("newrelic_ignore_transaction", Vec::new());
        if self.is_supported() {
            self.transaction_ignored.store(true, Ordering::SeqCst);
        }
    }

    fn is_transaction_sampled(&self) -> bool {
        is_truthy(&self.core.call("newrelic_is_sampled", Vec::new()))
    }

    fn end_transaction(&self) {
        if self.transaction_ended.load(Ordering::SeqCst) {
            return;
        }

        let ended = is_truthy(&self.core.call(
            "newrelic_end_transaction",
            vec![IGNORE_TRANSACTION_ON_END.into()],
        ));
        self.transaction_ended.store(ended, Ordering::SeqCst);
    }

    fn is_transaction_ended(&self) -> bool {
        self.transaction_ended.load(Ordering::SeqCst)
    }
}
