//! Backend-agnostic APM instrumentation client.
//!
//! Depend on this crate via `cargo add apm-sdk`. It bundles the workspace
//! crates behind feature flags so applications can pull in only the parts
//! they use, for instance just the metric schemas.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use apm_primitives as primitives;

/// Agents, transactions and client facades (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use apm_kernel as kernel;

/// Backend capability contract and function proxy (enabled by `backend` feature).
#[cfg(feature = "backend")]
pub use apm_backend as backend;

/// Metric values and definition schemas (enabled by `metrics` feature).
#[cfg(feature = "metrics")]
pub use apm_metrics as metrics;

/// Logger sinks and tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use apm_telemetry as telemetry;

/// Configuration sources and settings (enabled by `config` feature).
#[cfg(feature = "config")]
pub use apm_config as config;

/// Types most applications need.
#[cfg(feature = "kernel")]
pub mod prelude {
    pub use apm_kernel::{Agent, AgentExt, Browser, Client, NewRelicAgent, NullAgent, Transaction};
    pub use apm_primitives::{Datastore, Error, Result, SegmentQuery};
}
