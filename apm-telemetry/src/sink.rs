//! Logger sinks accepting informational agent notices.

use std::fmt;
use std::sync::Mutex;

/// Destination for informational notices emitted by agents.
pub trait LogSink: Send + Sync {
    /// Records an informational message.
    fn info(&self, message: &str);
}

/// Sink that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl LogSink for DiscardSink {
    fn info(&self, _message: &str) {}
}

/// Sink forwarding messages to `tracing` at `INFO` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }
}

/// Sink keeping every message in memory.
#[derive(Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    /// Creates an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded messages.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned by a previous panic.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .expect("collecting sink poisoned")
            .clone()
    }

    /// Number of recorded messages.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned by a previous panic.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().expect("collecting sink poisoned").len()
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns the recorded messages.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned by a previous panic.
    #[must_use]
    pub fn drain(&self) -> Vec<String> {
        let mut lock = self.messages.lock().expect("collecting sink poisoned");
        lock.drain(..).collect()
    }
}

impl fmt::Debug for CollectingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectingSink")
            .field("messages", &self.len())
            .finish()
    }
}

impl LogSink for CollectingSink {
    fn info(&self, message: &str) {
        self.messages
            .lock()
            .expect("collecting sink poisoned")
            .push(message.to_owned());
    }
}
