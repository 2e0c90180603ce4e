//! Metric definition schemas.

use apm_primitives::{Error, Result};
use tracing::debug;

use crate::builder::MetricBuilder;
use crate::metric::Metric;

/// Type tag of metrics created by byte definitions.
pub const BYTES_METRIC_TYPE: &str = "size|bytes";

/// Type tag of metrics created by percentage definitions.
pub const PERCENTAGE_METRIC_TYPE: &str = "percentage";

/// Type tag of metrics created by script-count definitions.
pub const SCRIPTS_METRIC_TYPE: &str = "scripts|amount";

fn guard_is_named(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_argument("Metric definitions must be named."));
    }
    Ok(())
}

/// Definition grouping child definitions under one name.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayMetricDefinition {
    name: String,
    children: Vec<MetricDefinition>,
}

impl ArrayMetricDefinition {
    /// Creates an empty group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        guard_is_named(&name)?;
        Ok(Self {
            name,
            children: Vec::new(),
        })
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `child`, replacing any existing child with the same name in place.
    ///
    /// The returned handle cannot rename the child, so names stay unique
    /// within the group.
    pub fn append(&mut self, child: MetricDefinition) -> AppendedDefinition<'_> {
        if let Some(index) = self
            .children
            .iter()
            .position(|existing| existing.name() == child.name())
        {
            debug!(group = %self.name, child = child.name(), "replacing metric definition");
            self.children[index] = child;
            return AppendedDefinition::new(&mut self.children[index]);
        }

        let index = self.children.len();
        self.children.push(child);
        AppendedDefinition::new(&mut self.children[index])
    }

    /// Child definitions in insertion order.
    #[must_use]
    pub fn children(&self) -> &[MetricDefinition] {
        &self.children
    }

    /// Looks up a child definition by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&MetricDefinition> {
        self.children.iter().find(|child| child.name() == name)
    }

    /// Returns a builder that appends into this group.
    pub fn metrics(&mut self) -> MetricBuilder<'_> {
        MetricBuilder::with_parent(self)
    }

    /// Materialises the group and all of its children.
    ///
    /// # Errors
    ///
    /// Propagates naming failures of the created metrics, such as reserved
    /// characters or two children materialising under the same name.
    pub fn create_metric(&self) -> Result<Metric> {
        let mut metric = Metric::array(self.name.clone())?;
        for child in &self.children {
            metric.append(child.create_metric()?)?;
        }
        Ok(metric)
    }
}

/// Definition of an integer measurement with an optional display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericMetricDefinition {
    name: String,
    label: Option<String>,
}

impl NumericMetricDefinition {
    /// Creates an unlabelled definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        guard_is_named(&name)?;
        Ok(Self { name, label: None })
    }

    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the label, if set.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Name the created metric carries: the label when set, else the name.
    #[must_use]
    pub fn metric_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Definition of a percentage measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentageMetricDefinition {
    name: String,
}

impl PercentageMetricDefinition {
    /// Creates the definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        guard_is_named(&name)?;
        Ok(Self { name })
    }

    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A named metric definition.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricDefinition {
    /// Group of child definitions.
    Array(ArrayMetricDefinition),
    /// Size in bytes.
    Byte(NumericMetricDefinition),
    /// Ratio expressed as a percentage.
    Percentage(PercentageMetricDefinition),
    /// Number of scripts.
    Scripts(NumericMetricDefinition),
}

impl MetricDefinition {
    /// Creates an empty group definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `name` is empty.
    pub fn array(name: impl Into<String>) -> Result<Self> {
        ArrayMetricDefinition::new(name).map(Self::Array)
    }

    /// Creates a byte-size definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `name` is empty.
    pub fn byte(name: impl Into<String>) -> Result<Self> {
        NumericMetricDefinition::new(name).map(Self::Byte)
    }

    /// Creates a percentage definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `name` is empty.
    pub fn percentage(name: impl Into<String>) -> Result<Self> {
        PercentageMetricDefinition::new(name).map(Self::Percentage)
    }

    /// Creates a script-count definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `name` is empty.
    pub fn scripts(name: impl Into<String>) -> Result<Self> {
        NumericMetricDefinition::new(name).map(Self::Scripts)
    }

    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Array(definition) => definition.name(),
            Self::Byte(definition) | Self::Scripts(definition) => definition.name(),
            Self::Percentage(definition) => definition.name(),
        }
    }

    /// Renames the definition.
    ///
    /// Only reachable before the definition is appended to a group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when `name` is empty; the current
    /// name is kept.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        guard_is_named(&name)?;
        match self {
            Self::Array(definition) => definition.name = name,
            Self::Byte(definition) | Self::Scripts(definition) => definition.name = name,
            Self::Percentage(definition) => definition.name = name,
        }
        Ok(self)
    }

    /// Builder tag the definition was created with.
    #[must_use]
    pub const fn type_tag(&self) -> &'static str {
        match self {
            Self::Array(_) => "array",
            Self::Byte(_) => "bytes",
            Self::Percentage(_) => "percentage",
            Self::Scripts(_) => "scripts",
        }
    }

    /// Sets the display label of a byte or script-count definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for other definitions.
    pub fn label(&mut self, label: impl Into<String>) -> Result<&mut Self> {
        match self {
            Self::Byte(definition) | Self::Scripts(definition) => {
                definition.label = Some(label.into());
                Ok(self)
            }
            _ => Err(Error::invalid_argument(format!(
                "{} definition \"{}\" does not take a label",
                self.type_tag(),
                self.name()
            ))),
        }
    }

    /// Returns the group when this is an array definition.
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayMetricDefinition> {
        match self {
            Self::Array(definition) => Some(definition),
            _ => None,
        }
    }

    /// Returns a builder that appends into this group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when this is not an array definition.
    pub fn metrics(&mut self) -> Result<MetricBuilder<'_>> {
        match self {
            Self::Array(definition) => Ok(definition.metrics()),
            _ => Err(Error::invalid_argument(format!(
                "{} definition \"{}\" cannot hold child metrics",
                self.type_tag(),
                self.name()
            ))),
        }
    }

    /// Materialises the definition into a metric.
    ///
    /// # Errors
    ///
    /// Propagates naming failures of the created metric tree.
    pub fn create_metric(&self) -> Result<Metric> {
        match self {
            Self::Array(definition) => definition.create_metric(),
            Self::Byte(definition) => Metric::integer(definition.metric_name(), BYTES_METRIC_TYPE),
            Self::Percentage(definition) => {
                Metric::float(definition.name(), PERCENTAGE_METRIC_TYPE)
            }
            Self::Scripts(definition) => Metric::integer(definition.name(), SCRIPTS_METRIC_TYPE),
        }
    }
}

/// Handle on a definition that was appended to a group or builder.
///
/// Exposes the post-append operations (labelling and nesting) but no
/// renaming.
#[derive(Debug)]
pub struct AppendedDefinition<'a> {
    definition: &'a mut MetricDefinition,
}

impl<'a> AppendedDefinition<'a> {
    pub(crate) fn new(definition: &'a mut MetricDefinition) -> Self {
        Self { definition }
    }

    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Builder tag the definition was created with.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        self.definition.type_tag()
    }

    /// Returns the appended definition.
    #[must_use]
    pub fn get(&self) -> &MetricDefinition {
        self.definition
    }

    /// Sets the display label. See [`MetricDefinition::label`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for definitions without a label.
    pub fn label(self, label: impl Into<String>) -> Result<Self> {
        self.definition.label(label)?;
        Ok(self)
    }

    /// Returns a builder that appends into the appended group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when this is not an array definition.
    pub fn metrics(self) -> Result<MetricBuilder<'a>> {
        let definition = self.definition;
        definition.metrics()
    }
}

impl From<ArrayMetricDefinition> for MetricDefinition {
    fn from(definition: ArrayMetricDefinition) -> Self {
        Self::Array(definition)
    }
}
