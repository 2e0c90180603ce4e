//! Core shared types for the APM instrumentation client.

#![warn(missing_docs, clippy::pedantic)]

mod datastore;
mod error;
mod value;

/// Datastore descriptors attached to transaction segments.
pub use datastore::{Datastore, SegmentQuery};
/// Error type and result alias shared across the SDK.
pub use error::{Error, Result};
/// Helpers for inspecting backend and parameter values.
pub use value::{ensure_scalar, is_truthy, value_type_name};
