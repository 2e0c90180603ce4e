//! Backend driven by a table of named functions.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use apm_config::{MapOptions, OptionSource};
use serde_json::Value;
use tracing::trace;

use crate::capability::{Argument, BackendCapability, BackendError, BackendResult};

/// Function registered in a [`FunctionTable`].
pub type NativeFunction =
    Arc<dyn Fn(&mut [Argument<'_>]) -> BackendResult<Value> + Send + Sync>;

/// A backend invocation captured by a [`FunctionTable`] with call logging
/// enabled.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    /// Name of the invoked operation.
    pub operation: String,
    /// Arguments rendered with [`Argument::render`].
    pub args: Vec<Value>,
}

/// Backend whose operations are plain Rust functions registered by name.
///
/// Embedders use it to bridge the agent onto whatever instrumentation library
/// the process actually links; tests use it, with call logging enabled, as a
/// backend double.
pub struct FunctionTable {
    available: bool,
    options: Box<dyn OptionSource>,
    functions: RwLock<HashMap<String, NativeFunction>>,
    calls: Option<Mutex<Vec<RecordedCall>>>,
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self {
            available: true,
            options: Box::new(MapOptions::new()),
            functions: RwLock::new(HashMap::new()),
            calls: None,
        }
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names();
        names.sort();
        f.debug_struct("FunctionTable")
            .field("available", &self.available)
            .field("registered", &names)
            .finish_non_exhaustive()
    }
}

impl FunctionTable {
    /// Creates an empty, available table without options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the table as (un)available in the current runtime.
    #[must_use]
    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Sets the option source answering [`BackendCapability::option`].
    #[must_use]
    pub fn with_options(mut self, options: impl OptionSource + 'static) -> Self {
        self.options = Box::new(options);
        self
    }

    /// Enables recording of every invocation.
    #[must_use]
    pub fn with_call_log(mut self) -> Self {
        self.calls = Some(Mutex::new(Vec::new()));
        self
    }

    /// Registers (or replaces) the function backing `operation`.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register<F>(&self, operation: impl Into<String>, function: F) -> &Self
    where
        F: Fn(&mut [Argument<'_>]) -> BackendResult<Value> + Send + Sync + 'static,
    {
        self.functions
            .write()
            .expect("function table poisoned")
            .insert(operation.into(), Arc::new(function));
        self
    }

    /// Registers `operation` as always returning `value`.
    pub fn register_value(&self, operation: impl Into<String>, value: Value) -> &Self {
        self.register(operation, move |_args: &mut [Argument<'_>]| Ok(value.clone()))
    }

    /// Returns `true` when `operation` is registered.
    #[must_use]
    pub fn contains(&self, operation: &str) -> bool {
        self.functions
            .read()
            .is_ok_and(|functions| functions.contains_key(operation))
    }

    /// Names of all registered operations.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.functions
            .read()
            .map(|functions| functions.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the recorded invocations, oldest first.
    ///
    /// Always empty unless [`FunctionTable::with_call_log`] was used.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex has been poisoned by a previous panic.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.as_ref().map_or_else(Vec::new, |calls| {
            calls.lock().expect("function table call log poisoned").clone()
        })
    }

    /// Returns how many times `operation` was invoked.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    fn record(&self, operation: &str, args: &[Argument<'_>]) {
        if let Some(calls) = &self.calls {
            calls
                .lock()
                .expect("function table call log poisoned")
                .push(RecordedCall {
                    operation: operation.to_owned(),
                    args: args.iter().map(Argument::render).collect(),
                });
        }
    }

    fn lookup(&self, operation: &str) -> Option<NativeFunction> {
        self.functions.read().ok()?.get(operation).cloned()
    }
}

impl BackendCapability for FunctionTable {
    fn is_available(&self) -> bool {
        self.available
    }

    fn option(&self, key: &str) -> Option<String> {
        self.options.option(key)
    }

    fn invoke(&self, operation: &str, mut args: Vec<Argument<'_>>) -> BackendResult<Value> {
        self.record(operation, &args);
        trace!(operation, args = args.len(), "invoking backend function");

        let function = self
            .lookup(operation)
            .ok_or_else(|| BackendError::not_found(operation))?;
        function(args.as_mut_slice())
    }
}
