//! Transaction handles.

use std::fmt;

use apm_primitives::{Datastore, Result, SegmentQuery};
use serde_json::Value;
use tracing::debug;

use crate::agent::{Agent, AgentExt};

/// Handle on one instrumented unit of work.
///
/// Every call delegates to the owning agent, which remains the authority on
/// backend state: ending is deduplicated by the agent, and
/// [`Transaction::is_ended`] asks the agent. Only the ignored flag and the
/// parameters added through this handle are tracked locally.
pub struct Transaction<'a> {
    agent: &'a dyn Agent,
    ignored: bool,
    parameters: Vec<(String, Value)>,
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("ignored", &self.ignored)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl<'a> Transaction<'a> {
    /// Creates a handle bound to `agent`.
    #[must_use]
    pub fn new(agent: &'a dyn Agent) -> Self {
        Self {
            agent,
            ignored: false,
            parameters: Vec::new(),
        }
    }

    /// Returns the agent this handle delegates to.
    #[must_use]
    pub fn agent(&self) -> &'a dyn Agent {
        self.agent
    }

    /// Ends this transaction and starts a new one.
    ///
    /// With `ignore_previous` this transaction is ignored first. The returned
    /// handle replaces this one; this handle stays queryable.
    #[must_use = "the returned handle tracks the new transaction"]
    pub fn start(&mut self, ignore_previous: bool) -> Transaction<'a> {
        if ignore_previous {
            self.ignore();
        }
        self.end();

        debug!(ignore_previous, "restarting transaction");
        self.agent.start_transaction(false)
    }

    /// Renames the transaction.
    pub fn change_name(&mut self, name: &str) -> &mut Self {
        self.agent.change_transaction_name(name);
        self
    }

    /// Adds a scalar (or `null`) parameter, replacing an earlier value under
    /// the same name.
    ///
    /// # Errors
    ///
    /// Propagates the agent's validation error; the local parameters are left
    /// unchanged in that case.
    pub fn add_parameter(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        self.agent.add_transaction_parameter(name, &value)?;

        match self.parameters.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.parameters.push((name.to_owned(), value)),
        }
        Ok(self)
    }

    /// Adds parameters in iteration order, stopping at the first rejected one.
    ///
    /// # Errors
    ///
    /// See [`Transaction::add_parameter`].
    pub fn add_parameters<I, K, V>(&mut self, parameters: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in parameters {
            self.add_parameter(name.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Parameters added through this handle, in insertion order.
    #[must_use]
    pub fn parameters(&self) -> &[(String, Value)] {
        &self.parameters
    }

    /// Looks up a parameter added through this handle.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Flags the transaction as background job or web transaction.
    pub fn mark_as_background(&mut self, background: bool) -> &mut Self {
        self.agent.mark_transaction_as_background(background);
        self
    }

    /// Reports `error` with its display string as message.
    pub fn record_exception(&mut self, error: &dyn std::error::Error) -> &mut Self {
        self.agent
            .record_transaction_exception(&error.to_string(), error);
        self
    }

    /// Runs `work` inside a datastore segment and returns its result.
    pub fn add_datastore_segment<F, R>(
        &self,
        datastore: &Datastore,
        query: &SegmentQuery,
        work: F,
    ) -> R
    where
        F: FnOnce() -> R,
    {
        self.agent.datastore_segment(datastore, query, work)
    }

    /// Stops timing without ending the transaction.
    pub fn stop_timing(&mut self) -> &mut Self {
        self.agent.stop_transaction_timing();
        self
    }

    /// Excludes the transaction from the apdex score.
    ///
    /// Always delegates; the agent decides whether the call is redundant.
    pub fn ignore_apdex(&mut self) -> &mut Self {
        self.agent.ignore_transaction_apdex();
        self
    }

    /// Drops the transaction.
    pub fn ignore(&mut self) -> &mut Self {
        self.agent.ignore_transaction();
        self.ignored = true;
        self
    }

    /// Returns `true` once [`Transaction::ignore`] was called on this handle.
    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Returns `true` when the backend samples the transaction.
    #[must_use]
    pub fn is_sampled(&self) -> bool {
        self.agent.is_transaction_sampled()
    }

    /// Ends the transaction.
    pub fn end(&mut self) -> &mut Self {
        self.agent.end_transaction();
        self
    }

    /// Returns `true` when the agent reports the transaction as ended.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.agent.is_transaction_ended()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use apm_backend::{Argument, FunctionTable};
    use apm_config::MapOptions;
    use apm_primitives::Error;
    use serde_json::json;

    use super::*;
    use crate::{NewRelicAgent, NullAgent};

    fn backend() -> Arc<FunctionTable> {
        let table = FunctionTable::new()
            .with_call_log()
            .with_options(
                MapOptions::new()
                    .with("newrelic.appname", "App name")
                    .with("newrelic.license", "1234567890"),
            );
        for operation in [
            "newrelic_start_transaction",
            "newrelic_end_transaction",
            "newrelic_name_transaction",
            "newrelic_add_custom_parameter",
            "newrelic_is_sampled",
        ] {
            table.register_value(operation, json!(true));
        }
        for operation in [
            "newrelic_background_job",
            "newrelic_notice_error",
            "newrelic_end_of_transaction",
            "newrelic_ignore_apdex",
            "newrelic_ignore_transaction",
        ] {
            table.register_value(operation, Value::Null);
        }
        table.register("newrelic_record_datastore_segment", |args: &mut [Argument<'_>]| {
            args[0].run_callback();
            Ok(Value::Null)
        });
        Arc::new(table)
    }

    #[derive(Debug)]
    struct Timeout;

    impl fmt::Display for Timeout {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Query timed out")
        }
    }

    impl std::error::Error for Timeout {}

    #[test]
    fn parameters_mirror_in_insertion_order() {
        let table = backend();
        let agent = NewRelicAgent::new(table.clone()).expect("agent");
        let mut transaction = Transaction::new(&agent);

        transaction
            .add_parameters([("first", json!(1)), ("second", json!("two"))])
            .expect("parameters")
            .add_parameter("first", json!(null))
            .expect("overwrite");

        assert_eq!(
            transaction.parameters(),
            [
                ("first".to_owned(), Value::Null),
                ("second".to_owned(), json!("two")),
            ]
        );
        assert_eq!(transaction.parameter("second"), Some(&json!("two")));
        assert_eq!(table.call_count("newrelic_add_custom_parameter"), 3);
    }

    #[test]
    fn rejected_parameters_are_not_mirrored() {
        let agent = NewRelicAgent::new(backend()).expect("agent");
        let mut transaction = Transaction::new(&agent);

        let err = transaction
            .add_parameter("payload", json!({ "nested": true }))
            .expect_err("non-scalar");
        assert_eq!(err, Error::NonScalarParameter { type_name: "object" });
        assert!(transaction.parameters().is_empty());
    }

    #[test]
    fn start_ignores_and_ends_previous() {
        let table = backend();
        let agent = NewRelicAgent::new(table.clone()).expect("agent");
        let mut first = agent.start_transaction(false);

        let second = first.start(true);
        assert!(first.is_ignored());
        assert!(!second.is_ignored());
        assert_eq!(table.call_count("newrelic_ignore_transaction"), 1);
        assert_eq!(table.call_count("newrelic_end_transaction"), 1);
        assert_eq!(table.call_count("newrelic_start_transaction"), 2);
        assert!(!second.is_ended());
    }

    #[test]
    fn ignore_apdex_always_delegates() {
        let table = backend();
        let agent = NewRelicAgent::new(table.clone()).expect("agent");
        let mut transaction = Transaction::new(&agent);

        transaction.ignore_apdex().ignore().ignore_apdex();

        assert!(transaction.is_ignored());
        assert_eq!(table.call_count("newrelic_ignore_transaction"), 1);
        assert_eq!(table.call_count("newrelic_ignore_apdex"), 1);
    }

    #[test]
    fn exceptions_forward_message_and_error() {
        let table = backend();
        let agent = NewRelicAgent::new(table.clone()).expect("agent");

        Transaction::new(&agent).record_exception(&Timeout);

        let calls = table.calls();
        assert_eq!(calls[0].operation, "newrelic_notice_error");
        assert_eq!(calls[0].args, [json!("Query timed out"), json!("Query timed out")]);
    }

    #[test]
    fn chained_calls_delegate() {
        let table = backend();
        let agent = NewRelicAgent::new(table.clone()).expect("agent");
        let mut transaction = Transaction::new(&agent);

        transaction
            .change_name("checkout")
            .mark_as_background(true)
            .stop_timing()
            .end();

        assert!(transaction.is_sampled());
        assert!(transaction.is_ended());
        let operations: Vec<_> = table.calls().into_iter().map(|c| c.operation).collect();
        assert_eq!(
            operations,
            [
                "newrelic_name_transaction",
                "newrelic_background_job",
                "newrelic_end_of_transaction",
                "newrelic_end_transaction",
                "newrelic_is_sampled",
            ]
        );
    }

    #[test]
    fn datastore_segment_returns_work_result() {
        let agent = NewRelicAgent::new(backend()).expect("agent");
        let transaction = Transaction::new(&agent);
        let datastore = Datastore::new("MySQL", "shop", "select");

        let rows = transaction.add_datastore_segment(&datastore, &SegmentQuery::new(), || {
            vec!["row-1", "row-2"]
        });
        assert_eq!(rows, ["row-1", "row-2"]);
    }

    #[test]
    fn null_agent_handles_are_inert() {
        let agent = NullAgent::new();
        let mut transaction = agent.start_transaction(false);

        transaction
            .add_parameter("user", "alice")
            .expect("parameter")
            .ignore();
        assert!(transaction.is_sampled());
        assert!(!transaction.is_ended());
        transaction.end();
        assert!(transaction.is_ended());
        assert_eq!(transaction.parameter("user"), Some(&json!("alice")));
    }
}
