//! Shared error definitions for the APM client.

use thiserror::Error;

/// Result alias used throughout the APM client.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to instrumentation call sites.
///
/// Only programmer errors and pathological construction failures are reported
/// through this type. Backend faults are neutralised by the agent dispatch
/// bridge and never reach callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Generic invalid argument supplied by the caller.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// An event, metric or parameter name collided with a reserved word.
    #[error("Cannot use reserved word \"{word}\" as metric name.")]
    ReservedWord {
        /// The offending word.
        word: String,
    },

    /// A transaction parameter value was neither a scalar nor null.
    #[error("Transaction parameter value must be scalar, \"{type_name}\" given.")]
    NonScalarParameter {
        /// Type of the offending value (`object`, `array`).
        type_name: &'static str,
    },

    /// Metric name failed validation.
    #[error("invalid metric name `{name}`: {reason}")]
    InvalidMetricName {
        /// The offending name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A metric with the same name was already appended to the parent.
    #[error("A metric named \"{name}\" was already added.")]
    DuplicateMetric {
        /// Name shared by both metrics.
        name: String,
    },

    /// The metric definition type tag has no registered definition.
    #[error("Metric type \"{tag}\" is not registered.")]
    UnknownMetricType {
        /// The unregistered tag.
        tag: String,
    },

    /// The named backend operation does not exist in the current runtime.
    #[error("Function \"{operation}\" does not exist.")]
    OperationUnavailable {
        /// Name of the missing operation.
        operation: String,
    },

    /// The agent refused to even attempt initialisation.
    #[error("agent initialisation refused: {reason}")]
    InitialisationRefused {
        /// Human-readable reason for the refusal.
        reason: String,
    },
}

impl Error {
    /// Convenience constructor for generic invalid arguments.
    #[must_use]
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for refused initialisation.
    #[must_use]
    pub fn initialisation_refused(reason: impl Into<String>) -> Self {
        Self::InitialisationRefused {
            reason: reason.into(),
        }
    }

    /// Returns `true` for every variant that represents a caller mistake.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::ReservedWord { .. }
                | Self::NonScalarParameter { .. }
                | Self::InvalidMetricName { .. }
                | Self::DuplicateMetric { .. }
                | Self::UnknownMetricType { .. }
        )
    }
}
