//! Materialised metric values.

use std::fmt::{self, Display, Formatter};

use apm_primitives::{Error, Result};
use serde_json::{Map, Number, Value};

/// Characters a metric name may not contain.
pub const NAME_RESERVED_CHARS: &str = "/][|*";

/// Type tag carried by array metrics.
pub const ARRAY_METRIC_TYPE: &str = "array";

/// Value shape of a [`Metric`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    /// Holds child metrics keyed by name.
    Array,
    /// Holds an integer measurement.
    Integer,
    /// Holds a floating point measurement.
    Float,
}

#[derive(Clone, Debug, PartialEq)]
enum MetricData {
    Array(Vec<Metric>),
    Integer(Option<i64>),
    Float(Option<f64>),
}

/// A typed, named measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    name: String,
    metric_type: String,
    data: MetricData,
}

impl Metric {
    /// Creates an empty array metric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetricName`] when `name` contains one of
    /// [`NAME_RESERVED_CHARS`].
    pub fn array(name: impl Into<String>) -> Result<Self> {
        Self::with_data(name.into(), ARRAY_METRIC_TYPE.to_owned(), MetricData::Array(Vec::new()))
    }

    /// Creates an integer metric without a value.
    ///
    /// # Errors
    ///
    /// See [`Metric::array`].
    pub fn integer(name: impl Into<String>, metric_type: impl Into<String>) -> Result<Self> {
        Self::with_data(name.into(), metric_type.into(), MetricData::Integer(None))
    }

    /// Creates a float metric without a value.
    ///
    /// # Errors
    ///
    /// See [`Metric::array`].
    pub fn float(name: impl Into<String>, metric_type: impl Into<String>) -> Result<Self> {
        Self::with_data(name.into(), metric_type.into(), MetricData::Float(None))
    }

    fn with_data(name: String, metric_type: String, data: MetricData) -> Result<Self> {
        guard_has_no_reserved_characters(&name)?;
        Ok(Self {
            name,
            metric_type,
            data,
        })
    }

    /// Returns the metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the metric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetricName`] when `name` contains one of
    /// [`NAME_RESERVED_CHARS`]; the current name is kept.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        guard_has_no_reserved_characters(&name)?;
        self.name = name;
        Ok(self)
    }

    /// Returns the type tag, e.g. `size|bytes`.
    #[must_use]
    pub fn metric_type(&self) -> &str {
        &self.metric_type
    }

    /// Replaces the type tag.
    pub fn set_type(&mut self, metric_type: impl Into<String>) -> &mut Self {
        self.metric_type = metric_type.into();
        self
    }

    /// Returns the value shape.
    #[must_use]
    pub fn kind(&self) -> MetricKind {
        match self.data {
            MetricData::Array(_) => MetricKind::Array,
            MetricData::Integer(_) => MetricKind::Integer,
            MetricData::Float(_) => MetricKind::Float,
        }
    }

    /// Appends a child to an array metric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when this is not an array metric or
    /// the child is unnamed, and [`Error::DuplicateMetric`] when a child with
    /// the same name was already appended. The existing children are left
    /// untouched in every error case.
    pub fn append(&mut self, metric: Metric) -> Result<&mut Self> {
        let MetricData::Array(children) = &mut self.data else {
            return Err(Error::invalid_argument(format!(
                "metric \"{}\" is not an array metric",
                self.name
            )));
        };

        if metric.name.is_empty() {
            return Err(Error::invalid_argument("Metrics must be named."));
        }

        if children.iter().any(|child| child.name == metric.name) {
            return Err(Error::DuplicateMetric { name: metric.name });
        }

        children.push(metric);
        Ok(self)
    }

    /// Child metrics in insertion order; empty for scalar metrics.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        match &self.data {
            MetricData::Array(children) => children,
            _ => &[],
        }
    }

    /// Looks up a child metric by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics().iter().find(|child| child.name == name)
    }

    /// Looks up a child metric by name for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Metric> {
        match &mut self.data {
            MetricData::Array(children) => children.iter_mut().find(|child| child.name == name),
            _ => None,
        }
    }

    /// Stores a measurement, coerced to the metric's value type.
    ///
    /// Integer metrics truncate floats and parse numeric strings, float metrics
    /// widen integers; booleans count as `0`/`1` and `null` as zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for array metrics, whose value is
    /// derived from their children, and for non-scalar inputs.
    pub fn set_value(&mut self, raw: &Value) -> Result<&mut Self> {
        match &mut self.data {
            MetricData::Array(_) => {
                return Err(Error::invalid_argument(format!(
                    "array metric \"{}\" derives its value from its children",
                    self.name
                )));
            }
            MetricData::Integer(value) => *value = Some(finalize_integer(raw)?),
            MetricData::Float(value) => *value = Some(finalize_float(raw)?),
        }
        Ok(self)
    }

    /// Returns the finalised value.
    ///
    /// Array metrics yield an object mapping child names to child values;
    /// scalar metrics yield their number, or `null` while unset.
    #[must_use]
    pub fn value(&self) -> Value {
        match &self.data {
            MetricData::Array(children) => Value::Object(
                children
                    .iter()
                    .map(|child| (child.name.clone(), child.value()))
                    .collect::<Map<_, _>>(),
            ),
            MetricData::Integer(value) => value.map_or(Value::Null, Value::from),
            MetricData::Float(value) => value
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.metric_type)
    }
}

fn guard_has_no_reserved_characters(name: &str) -> Result<()> {
    if name.contains(|c| NAME_RESERVED_CHARS.contains(c)) {
        return Err(Error::InvalidMetricName {
            name: name.to_owned(),
            reason: format!("Metric name cannot contain \"{NAME_RESERVED_CHARS}\" characters."),
        });
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn finalize_integer(raw: &Value) -> Result<i64> {
    match raw {
        Value::Null => Ok(0),
        Value::Bool(flag) => Ok(i64::from(*flag)),
        Value::Number(number) => Ok(number
            .as_i64()
            .unwrap_or_else(|| number.as_f64().map_or(0, |f| f as i64))),
        Value::String(text) => {
            let text = text.trim();
            Ok(text
                .parse::<i64>()
                .or_else(|_| text.parse::<f64>().map(|f| f as i64))
                .unwrap_or(0))
        }
        Value::Array(_) | Value::Object(_) => Err(non_scalar_value()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn finalize_float(raw: &Value) -> Result<f64> {
    match raw {
        Value::Null => Ok(0.0),
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => Ok(number.as_f64().unwrap_or(0.0)),
        Value::String(text) => Ok(text.trim().parse::<f64>().unwrap_or(0.0)),
        Value::Array(_) | Value::Object(_) => Err(non_scalar_value()),
    }
}

fn non_scalar_value() -> Error {
    Error::invalid_argument("metric value must be a scalar")
}
