//! Key/value option sources consulted by backends.

use std::collections::BTreeMap;

use anyhow::{Context, bail};
use serde_json::Value;

/// Read-only view over backend configuration options.
pub trait OptionSource: Send + Sync {
    /// Returns the option stored under `key`, or `None` when it is absent.
    fn option(&self, key: &str) -> Option<String>;
}

impl<F> OptionSource for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn option(&self, key: &str) -> Option<String> {
        (self)(key)
    }
}

/// Options backed by process environment variables.
///
/// Dotted keys map to upper-case variables: `newrelic.appname` is read from
/// `NEWRELIC_APPNAME`, or from `<PREFIX>NEWRELIC_APPNAME` when a prefix is set.
#[derive(Debug, Clone, Default)]
pub struct EnvOptions {
    prefix: String,
}

impl EnvOptions {
    /// Creates a source reading unprefixed variables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source reading variables that start with `prefix`.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the environment variable consulted for `key`.
    #[must_use]
    pub fn env_key(&self, key: &str) -> String {
        let mut name = self.prefix.clone();
        name.extend(key.chars().map(|c| match c {
            '.' | '-' => '_',
            other => other.to_ascii_uppercase(),
        }));
        name
    }
}

impl OptionSource for EnvOptions {
    fn option(&self, key: &str) -> Option<String> {
        std::env::var(self.env_key(key)).ok()
    }
}

/// In-memory options, typically loaded from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapOptions {
    values: BTreeMap<String, String>,
}

impl MapOptions {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an option.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces an option in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Number of options stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no option is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parses a flat JSON object into options.
    ///
    /// Strings are kept as-is, numbers and booleans are rendered with their
    /// JSON representation and `null` entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is not valid JSON, is not an object, or
    /// contains nested arrays or objects.
    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        let parsed: Value = serde_json::from_str(input).context("options are not valid JSON")?;
        let Value::Object(entries) = parsed else {
            bail!("options must be a JSON object");
        };

        let mut options = Self::new();
        for (key, value) in entries {
            match value {
                Value::Null => {}
                Value::String(s) => options.insert(key, s),
                Value::Bool(_) | Value::Number(_) => options.insert(key, value.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    bail!("option `{key}` must be a scalar value");
                }
            }
        }
        Ok(options)
    }
}

impl<K, V> FromIterator<(K, V)> for MapOptions
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl OptionSource for MapOptions {
    fn option(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
