//! Backend capability contract.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Result alias for backend invocations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Positional argument passed to a backend operation.
///
/// Besides plain JSON values, operations may receive the error being reported
/// or a unit of work to run inside an instrumented segment.
pub enum Argument<'a> {
    /// Plain value.
    Value(Value),
    /// Error reported to the backend.
    Error(&'a (dyn std::error::Error + 'a)),
    /// Unit of work the backend must run exactly once.
    Callback(&'a mut (dyn FnMut() + 'a)),
}

impl Argument<'_> {
    /// Returns the wrapped value for [`Argument::Value`].
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Renders the argument as JSON for diagnostics and call logs.
    ///
    /// Errors render as their display string, callbacks as `"<callback>"`.
    #[must_use]
    pub fn render(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Error(err) => Value::String(err.to_string()),
            Self::Callback(_) => Value::String("<callback>".to_owned()),
        }
    }

    /// Runs the wrapped callback, returning `false` for other arguments.
    pub fn run_callback(&mut self) -> bool {
        match self {
            Self::Callback(work) => {
                work();
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}

impl From<Value> for Argument<'_> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Argument<'_> {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for Argument<'_> {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for Argument<'_> {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for Argument<'_> {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

/// Failures raised by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The operation does not exist in the current runtime.
    #[error("operation `{operation}` does not exist")]
    OperationNotFound {
        /// Name of the missing operation.
        operation: String,
    },

    /// The operation exists but failed.
    #[error("operation `{operation}` failed: {reason}")]
    Failed {
        /// Name of the failing operation.
        operation: String,
        /// Human-readable failure reason.
        reason: String,
    },
}

impl BackendError {
    /// Convenience constructor for missing operations.
    #[must_use]
    pub fn not_found(operation: impl Into<String>) -> Self {
        Self::OperationNotFound {
            operation: operation.into(),
        }
    }

    /// Convenience constructor for failing operations.
    #[must_use]
    pub fn failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Capabilities an instrumentation backend offers to agents.
pub trait BackendCapability: Send + Sync {
    /// Returns `true` when the backend can be used in the current runtime
    /// (for instance, when the native extension is loaded).
    fn is_available(&self) -> bool;

    /// Reads a backend configuration option.
    fn option(&self, key: &str) -> Option<String>;

    /// Invokes the named operation with positional arguments.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::OperationNotFound`] for unknown operations and
    /// [`BackendError::Failed`] when the operation itself fails.
    fn invoke(&self, operation: &str, args: Vec<Argument<'_>>) -> BackendResult<Value>;
}

/// Backend for runtimes without any instrumentation support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackend;

impl BackendCapability for NoBackend {
    fn is_available(&self) -> bool {
        false
    }

    fn option(&self, _key: &str) -> Option<String> {
        None
    }

    fn invoke(&self, operation: &str, _args: Vec<Argument<'_>>) -> BackendResult<Value> {
        Err(BackendError::not_found(operation))
    }
}
