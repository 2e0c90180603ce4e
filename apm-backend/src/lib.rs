//! Instrumentation backends and the fail-soft function proxy.
//!
//! A backend exposes named operations (mirroring the native functions of an
//! APM extension) through [`BackendCapability::invoke`]. Agents never call a
//! backend directly: they go through a [`FunctionProxy`], which turns backend
//! faults into a neutral `false` and only reports operations that do not exist
//! at all.

#![warn(missing_docs, clippy::pedantic)]

mod capability;
mod proxy;
mod table;

pub use capability::{Argument, BackendCapability, BackendError, BackendResult, NoBackend};
pub use proxy::FunctionProxy;
pub use table::{FunctionTable, NativeFunction, RecordedCall};
