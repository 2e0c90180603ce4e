//! Helpers for inspecting JSON values exchanged with backends.

use serde_json::Value;

use crate::error::{Error, Result};

/// Returns the type name used in diagnostics for `value`.
#[must_use]
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ensures `value` is a scalar (bool, number, string) or null.
///
/// # Errors
///
/// Returns [`Error::NonScalarParameter`] naming the offending type for arrays
/// and objects.
pub fn ensure_scalar(value: &Value) -> Result<()> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(Error::NonScalarParameter {
            type_name: value_type_name(value),
        }),
        _ => Ok(()),
    }
}

/// Interprets a backend return value as a success flag.
///
/// Backends report success loosely: `true`, non-zero numbers and non-empty
/// strings count as success, `false`, `null`, zero and empty values do not.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
