//! Structured metrics.
//!
//! A schema of [`MetricDefinition`]s is assembled once, usually at process
//! start, through a fluent [`MetricBuilder`]. Calling
//! [`MetricDefinition::create_metric`] materialises the schema into a tree of
//! typed [`Metric`] values ready to be filled in and reported.
//!
//! ```
//! use apm_metrics::{ArrayMetricDefinition, BYTES_METRIC_TYPE};
//!
//! # fn main() -> apm_primitives::Result<()> {
//! let mut page = ArrayMetricDefinition::new("page")?;
//! {
//!     let mut metrics = page.metrics();
//!     metrics.byte_metric("size")?;
//!     metrics.percentage_metric("cache_hit")?;
//! }
//!
//! let metric = page.create_metric()?;
//! assert_eq!(metric.get("size").map(|m| m.metric_type()), Some(BYTES_METRIC_TYPE));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

mod builder;
mod definition;
mod metric;

pub use builder::{DefinitionFactory, MetricBuilder};
pub use definition::{
    AppendedDefinition, ArrayMetricDefinition, BYTES_METRIC_TYPE, MetricDefinition,
    NumericMetricDefinition, PERCENTAGE_METRIC_TYPE, PercentageMetricDefinition,
    SCRIPTS_METRIC_TYPE,
};
pub use metric::{ARRAY_METRIC_TYPE, Metric, MetricKind, NAME_RESERVED_CHARS};
