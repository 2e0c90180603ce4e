//! Agent initialisation lifecycle, reserved words and the dispatch bridge.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, RwLock};

use apm_backend::{Argument, BackendCapability, FunctionProxy};
use apm_primitives::{Error, Result};
use apm_telemetry::{DiscardSink, LogSink};
use serde_json::Value;
use tracing::{debug, warn};

/// Notice logged for every call on an agent that did not initialise.
pub const NOT_INITIALISED_NOTICE: &str = "[APM] Client was not initialised.";

/// States an agent can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Constructed, initialisation hook not run yet.
    Uninitialised,
    /// Initialisation succeeded; calls reach the backend.
    Initialised,
    /// Initialisation ran and found the backend unusable. Permanent.
    Unsupported,
}

impl AgentState {
    /// Returns `true` for [`AgentState::Initialised`].
    #[must_use]
    pub const fn is_initialised(self) -> bool {
        matches!(self, Self::Initialised)
    }
}

/// State shared by every agent: initialisation outcome, reserved words, logger
/// and the fail-soft bridge onto the backend.
pub struct AgentCore {
    state: AgentState,
    reserved_words: RwLock<BTreeSet<String>>,
    logger: Arc<dyn LogSink>,
    proxy: FunctionProxy,
}

impl fmt::Debug for AgentCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentCore")
            .field("state", &self.state)
            .field("reserved_words", &self.reserved_words)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

impl AgentCore {
    /// Builds the core over `backend` and runs the initialisation hook once.
    ///
    /// Only a [`DiscardSink`] is wired while `initialise` runs. The hook
    /// returns `Ok(true)` when the agent is usable and `Ok(false)` when the
    /// backend is unsupported in this runtime.
    ///
    /// # Errors
    ///
    /// Propagates the hook's error, which is reserved for refusing to attempt
    /// initialisation at all (see [`Error::InitialisationRefused`]).
    pub fn bootstrap<F>(backend: Arc<dyn BackendCapability>, initialise: F) -> Result<Self>
    where
        F: FnOnce(&mut Self) -> Result<bool>,
    {
        let mut core = Self::uninitialised(backend);

        let next_state = if initialise(&mut core)? {
            AgentState::Initialised
        } else {
            AgentState::Unsupported
        };
        debug!(from = ?core.state, to = ?next_state, "agent initialisation");
        core.state = next_state;

        Ok(core)
    }

    /// Builds a core that is initialised without running a hook.
    #[must_use]
    pub fn initialised(backend: Arc<dyn BackendCapability>) -> Self {
        let mut core = Self::uninitialised(backend);
        core.state = AgentState::Initialised;
        core
    }

    fn uninitialised(backend: Arc<dyn BackendCapability>) -> Self {
        Self {
            state: AgentState::Uninitialised,
            reserved_words: RwLock::new(BTreeSet::new()),
            logger: Arc::new(DiscardSink),
            proxy: FunctionProxy::new(backend),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// Returns `true` when initialisation succeeded.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.state.is_initialised()
    }

    /// Returns the backend behind the bridge.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn BackendCapability> {
        self.proxy.backend()
    }

    /// Replaces the reserved word set.
    ///
    /// # Panics
    ///
    /// Panics if the reserved word lock is poisoned.
    pub fn reserve_words<I, S>(&self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: BTreeSet<String> = words.into_iter().map(Into::into).collect();
        debug!(count = words.len(), "reserved words replaced");
        *self
            .reserved_words
            .write()
            .expect("reserved words lock poisoned") = words;
    }

    /// Returns `true` when `word`, ignoring surrounding whitespace, is reserved.
    ///
    /// # Panics
    ///
    /// Panics if the reserved word lock is poisoned.
    #[must_use]
    pub fn is_reserved_word(&self, word: &str) -> bool {
        self.reserved_words
            .read()
            .expect("reserved words lock poisoned")
            .contains(word.trim())
    }

    /// Fails when `word` is reserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedWord`].
    pub fn guard_is_not_reserved_word(&self, word: &str) -> Result<()> {
        if self.is_reserved_word(word) {
            return Err(Error::ReservedWord {
                word: word.to_owned(),
            });
        }
        Ok(())
    }

    /// Returns the logger sink.
    #[must_use]
    pub fn logger(&self) -> &dyn LogSink {
        self.logger.as_ref()
    }

    /// Replaces the logger sink.
    pub fn set_logger(&mut self, logger: Arc<dyn LogSink>) {
        self.logger = logger;
    }

    /// Forwards `operation` to the backend.
    ///
    /// Never fails: an uninitialised agent logs [`NOT_INITIALISED_NOTICE`]
    /// and returns `false` without touching the backend, unknown operations
    /// and backend failures also yield `false`.
    pub fn call(&self, operation: &str, args: Vec<Argument<'_>>) -> Value {
        if !self.is_supported() {
            self.logger.info(NOT_INITIALISED_NOTICE);
            return Value::Bool(false);
        }

        debug!(operation, "dispatching backend operation");
        match self.proxy.call(operation, args) {
            Ok(value) => value,
            Err(err) => {
                warn!(operation, error = %err, "backend operation unavailable");
                Value::Bool(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use apm_backend::{FunctionTable, NoBackend};
    use apm_telemetry::CollectingSink;
    use serde_json::json;
    use tracing_test::traced_test;

    fn table() -> Arc<FunctionTable> {
        let table = FunctionTable::new().with_call_log();
        table.register_value("stub", json!("\"stub\" was called"));
        Arc::new(table)
    }

    #[test]
    fn hook_outcome_decides_state() {
        let core = AgentCore::bootstrap(table(), |_| Ok(true)).expect("core");
        assert_eq!(core.state(), AgentState::Initialised);
        assert!(core.is_supported());

        let core = AgentCore::bootstrap(table(), |_| Ok(false)).expect("core");
        assert_eq!(core.state(), AgentState::Unsupported);
        assert!(!core.is_supported());
    }

    #[test]
    fn refusal_is_fatal() {
        let err = AgentCore::bootstrap(Arc::new(NoBackend), |_| {
            Err(Error::initialisation_refused("no configuration"))
        })
        .expect_err("refused");
        assert!(matches!(err, Error::InitialisationRefused { .. }));
    }

    #[test]
    fn hook_cannot_reach_the_final_logger() {
        let sink = Arc::new(CollectingSink::new());
        let mut core = AgentCore::bootstrap(table(), |core| {
            core.logger().info("during initialisation");
            Ok(true)
        })
        .expect("core");
        core.set_logger(sink.clone());

        assert!(sink.is_empty());
    }

    #[test]
    fn reserved_words_are_trimmed() {
        let core = AgentCore::bootstrap(table(), |core| {
            core.reserve_words(["reserved", "words"]);
            Ok(true)
        })
        .expect("core");

        assert!(core.is_reserved_word(" reserved "));
        assert!(!core.is_reserved_word("other"));
        assert_eq!(
            core.guard_is_not_reserved_word("words"),
            Err(Error::ReservedWord {
                word: "words".into()
            })
        );
        assert_eq!(
            core.guard_is_not_reserved_word("words")
                .expect_err("reserved")
                .to_string(),
            "Cannot use reserved word \"words\" as metric name."
        );
    }

    #[test]
    fn reserving_again_replaces_the_set() {
        let core = AgentCore::initialised(table());
        core.reserve_words(["first"]);
        core.reserve_words(["second", "third"]);

        assert!(!core.is_reserved_word("first"));
        assert!(core.is_reserved_word("third"));

        core.reserve_words(Vec::<String>::new());
        assert!(!core.is_reserved_word("second"));
    }

    #[test]
    fn bridge_short_circuits_when_unsupported() {
        let backend = table();
        let sink = Arc::new(CollectingSink::new());
        let mut core = AgentCore::bootstrap(backend.clone(), |_| Ok(false)).expect("core");
        core.set_logger(sink.clone());

        assert_eq!(core.call("stub", Vec::new()), json!(false));
        assert_eq!(sink.messages(), [NOT_INITIALISED_NOTICE]);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn bridge_forwards_and_neutralises() {
        let backend = table();
        let core = AgentCore::bootstrap(backend.clone(), |_| Ok(true)).expect("core");

        assert_eq!(core.call("stub", Vec::new()), json!("\"stub\" was called"));
        assert_eq!(core.call("missing", vec!["x".into()]), json!(false));
        assert_eq!(backend.call_count("stub"), 1);
        assert_eq!(backend.call_count("missing"), 1);
    }

    #[test]
    #[traced_test]
    fn neutralised_operations_are_traced() {
        let core = AgentCore::bootstrap(table(), |_| Ok(true)).expect("core");
        core.call("missing", Vec::new());

        assert!(logs_contain("dispatching backend operation"));
        assert!(logs_contain("backend operation unavailable"));
    }
}
