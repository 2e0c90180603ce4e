//! Fail-soft proxy in front of a backend.

use std::fmt;
use std::sync::Arc;

use apm_primitives::{Error, Result};
use serde_json::Value;
use tracing::warn;

use crate::capability::{Argument, BackendCapability, BackendError};

/// Invokes named backend operations, converting operation failures into
/// `false`.
///
/// Missing operations are still reported as [`Error::OperationUnavailable`];
/// callers that must never fail (the agent dispatch bridge) neutralise that
/// error themselves.
#[derive(Clone)]
pub struct FunctionProxy {
    backend: Arc<dyn BackendCapability>,
}

impl fmt::Debug for FunctionProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionProxy")
            .field("available", &self.backend.is_available())
            .finish()
    }
}

impl FunctionProxy {
    /// Creates a proxy over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn BackendCapability>) -> Self {
        Self { backend }
    }

    /// Returns the proxied backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn BackendCapability> {
        &self.backend
    }

    /// Calls `operation` with `args`.
    ///
    /// Returns the operation's result, which may itself be `false`, or `false`
    /// when the operation failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationUnavailable`] when the backend does not know
    /// the operation.
    pub fn call(&self, operation: &str, args: Vec<Argument<'_>>) -> Result<Value> {
        match self.backend.invoke(operation, args) {
            Ok(value) => Ok(value),
            Err(BackendError::OperationNotFound { operation }) => {
                Err(Error::OperationUnavailable { operation })
            }
            Err(BackendError::Failed { operation, reason }) => {
                warn!(%operation, %reason, "backend operation failed");
                Ok(Value::Bool(false))
            }
        }
    }
}
