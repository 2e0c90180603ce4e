//! The agent contract.

use apm_backend::Argument;
use apm_primitives::{Datastore, Result, SegmentQuery};
use serde_json::{Map, Value};

use crate::lifecycle::AgentCore;
use crate::transaction::Transaction;

/// A configured connection to an instrumentation backend.
///
/// Every instrumentation method is fail-soft: on an agent that did not
/// initialise it logs one notice and returns a neutral value. Only
/// programmer errors (reserved names, non-scalar parameters) are returned as
/// [`apm_primitives::Error`], before anything reaches the backend.
pub trait Agent: Send + Sync {
    /// Shared lifecycle, reserved-word and dispatch state.
    fn core(&self) -> &AgentCore;

    /// Returns `true` when initialisation succeeded.
    fn is_supported(&self) -> bool {
        self.core().is_supported()
    }

    /// Returns `true` when `word` may not be used as an event, metric or
    /// parameter name.
    fn is_reserved_word(&self, word: &str) -> bool {
        self.core().is_reserved_word(word)
    }

    /// Replaces the names forbidden for events, metrics and parameters.
    fn reserve_words(&self, words: &[&str]) {
        self.core().reserve_words(words.iter().copied());
    }

    /// Forwards a backend operation outside the typed contract.
    fn call(&self, operation: &str, args: Vec<Argument<'_>>) -> Value {
        self.core().call(operation, args)
    }

    /// Creates a transaction handle bound to `agent`, which need not be `self`.
    fn create_transaction<'a>(&self, agent: &'a dyn Agent) -> Transaction<'a> {
        Transaction::new(agent)
    }

    /// Reports subsequent data under another application name.
    fn change_application_name(&self, name: &str, ignore_transaction: bool);

    /// Enables or disables capturing of URL parameters.
    fn capture_url_parameters(&self, enable: bool);

    /// Records a custom event.
    ///
    /// # Errors
    ///
    /// Returns [`apm_primitives::Error::ReservedWord`] when `name` is reserved.
    fn record_custom_event(&self, name: &str, attributes: &Map<String, Value>) -> Result<()>;

    /// Records a custom timing metric.
    ///
    /// # Errors
    ///
    /// Returns [`apm_primitives::Error::ReservedWord`] when `name` is reserved.
    fn add_custom_metric(&self, name: &str, milliseconds: f64) -> Result<()>;

    /// Stops the backend from injecting browser timing scripts itself.
    fn disable_automatic_browser_monitoring_scripts(&self);

    /// Browser timing script for the page header, or an empty string.
    fn get_browser_monitoring_header_script(&self) -> String;

    /// Browser timing script for the page footer, or an empty string.
    fn get_browser_monitoring_footer_script(&self) -> String;

    /// Starts a new backend transaction.
    ///
    /// Always returns a handle, even when the backend could not start one.
    fn start_transaction(&self, ignore_previous: bool) -> Transaction<'_>;

    /// Renames the current transaction.
    fn change_transaction_name(&self, name: &str);

    /// Attaches a parameter to the current transaction.
    ///
    /// # Errors
    ///
    /// Returns [`apm_primitives::Error::ReservedWord`] for reserved names and
    /// [`apm_primitives::Error::NonScalarParameter`] for arrays and objects.
    fn add_transaction_parameter(&self, name: &str, value: &Value) -> Result<()>;

    /// Flags the current transaction as a background job, or as a web
    /// transaction again.
    fn mark_transaction_as_background(&self, background: bool);

    /// Reports `error` on the current transaction.
    fn record_transaction_exception(&self, message: &str, error: &dyn std::error::Error);

    /// Wraps `work` in a datastore segment.
    ///
    /// Implementations hand `work` to the backend, which runs it at most once.
    /// Use [`AgentExt::datastore_segment`] to get the work's result back.
    fn add_transaction_datastore_segment(
        &self,
        datastore: &Datastore,
        query: &SegmentQuery,
        work: &mut dyn FnMut(),
    );

    /// Stops timing the current transaction without ending it.
    fn stop_transaction_timing(&self);

    /// Excludes the current transaction from the apdex score.
    fn ignore_transaction_apdex(&self);

    /// Drops the current transaction.
    fn ignore_transaction(&self);

    /// Returns `true` when the current transaction is sampled.
    fn is_transaction_sampled(&self) -> bool;

    /// Ends the current transaction. Idempotent.
    fn end_transaction(&self);

    /// Returns `true` once the current transaction has ended.
    fn is_transaction_ended(&self) -> bool;
}

/// Generic conveniences available on every [`Agent`], including trait objects.
pub trait AgentExt: Agent {
    /// Runs `work` inside a datastore segment and returns its result unchanged.
    ///
    /// `work` runs exactly once: inside the backend's segment when the
    /// backend takes it, otherwise inline.
    fn datastore_segment<F, R>(&self, datastore: &Datastore, query: &SegmentQuery, work: F) -> R
    where
        F: FnOnce() -> R,
    {
        let mut work = Some(work);
        let mut output = None;
        self.add_transaction_datastore_segment(datastore, query, &mut || {
            if let Some(work) = work.take() {
                output = Some(work());
            }
        });

        match (output, work) {
            (Some(output), _) => output,
            (None, Some(work)) => work(),
            (None, None) => unreachable!("segment work taken without producing output"),
        }
    }
}

impl<A: Agent + ?Sized> AgentExt for A {}
