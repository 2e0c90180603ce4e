//! Agent contract, agents and transaction handles.
//!
//! An [`Agent`] wraps one instrumentation backend behind a fail-soft contract:
//! [`NewRelicAgent`] drives the New Relic extension through an injected
//! [`apm_backend::BackendCapability`], [`NullAgent`] records nothing.
//! Application code normally goes through a [`Client`], which hands out
//! [`Transaction`] and [`Browser`] facades.
//!
//! ```
//! use apm_kernel::Client;
//!
//! let client = Client::default();
//! let mut transaction = client.start_transaction(false);
//! transaction.change_name("checkout").mark_as_background(false);
//! transaction.end();
//! assert!(transaction.is_ended());
//! ```

#![warn(missing_docs, clippy::pedantic)]

mod agent;
mod client;
mod lifecycle;
mod newrelic;
mod null;
mod transaction;

pub use agent::{Agent, AgentExt};
pub use client::{Browser, Client};
pub use lifecycle::{AgentCore, AgentState, NOT_INITIALISED_NOTICE};
pub use newrelic::{APP_NAME_OPTION, LICENSE_OPTION, NewRelicAgent, RESERVED_WORDS};
pub use null::{NULL_FOOTER_SCRIPT, NULL_HEADER_SCRIPT, NullAgent};
pub use transaction::Transaction;
