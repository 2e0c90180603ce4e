//! Configuration management for the APM client.
//!
//! Backends read their settings through an [`OptionSource`]; the SDK-level
//! settings live in [`ApmConfig`].

#![warn(missing_docs, clippy::pedantic)]

mod options;
mod settings;

pub use options::{EnvOptions, MapOptions, OptionSource};
pub use settings::ApmConfig;
