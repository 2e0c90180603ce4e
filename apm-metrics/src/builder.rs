//! Fluent construction of metric definition schemas.

use std::collections::BTreeMap;
use std::fmt;

use apm_primitives::{Error, Result};

use crate::definition::{AppendedDefinition, ArrayMetricDefinition, MetricDefinition};

/// Constructor registered for a definition type tag.
pub type DefinitionFactory = fn(String) -> Result<MetricDefinition>;

enum Target<'p> {
    Detached(Vec<MetricDefinition>),
    Parent(&'p mut ArrayMetricDefinition),
}

/// Creates named [`MetricDefinition`]s from type tags.
///
/// A builder obtained from [`ArrayMetricDefinition::metrics`] appends every
/// definition it creates into that group. A detached builder from
/// [`MetricBuilder::new`] collects them until [`MetricBuilder::into_definitions`].
///
/// The tags `array`, `bytes`, `percentage` and `scripts` are registered by
/// default; further tags can be added with [`MetricBuilder::register`].
pub struct MetricBuilder<'p> {
    target: Target<'p>,
    mapping: BTreeMap<String, DefinitionFactory>,
}

impl fmt::Debug for MetricBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parent = match &self.target {
            Target::Detached(_) => None,
            Target::Parent(parent) => Some(parent.name()),
        };
        f.debug_struct("MetricBuilder")
            .field("parent", &parent)
            .field("types", &self.mapping.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for MetricBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricBuilder<'static> {
    /// Creates a builder without a parent group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: Target::Detached(Vec::new()),
            mapping: default_mapping(),
        }
    }
}

impl<'p> MetricBuilder<'p> {
    pub(crate) fn with_parent(parent: &'p mut ArrayMetricDefinition) -> Self {
        Self {
            target: Target::Parent(parent),
            mapping: default_mapping(),
        }
    }

    /// Registers (or replaces) the factory used for `tag`.
    pub fn register(&mut self, tag: impl Into<String>, factory: DefinitionFactory) -> &mut Self {
        self.mapping.insert(tag.into(), factory);
        self
    }

    /// Returns `true` when definitions are appended into a parent group.
    #[must_use]
    pub fn has_parent(&self) -> bool {
        matches!(self.target, Target::Parent(_))
    }

    /// Creates a definition of type `tag` named `name` and appends it.
    ///
    /// A same-named definition already appended to the parent is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMetricType`] for unregistered tags and
    /// [`Error::InvalidArgument`] when `name` is empty.
    pub fn definition(
        &mut self,
        name: impl Into<String>,
        tag: &str,
    ) -> Result<AppendedDefinition<'_>> {
        let factory = self
            .mapping
            .get(tag)
            .copied()
            .ok_or_else(|| Error::UnknownMetricType {
                tag: tag.to_owned(),
            })?;
        let definition = factory(name.into())?;

        Ok(match &mut self.target {
            Target::Parent(parent) => parent.append(definition),
            Target::Detached(definitions) => {
                let index = definitions.len();
                definitions.push(definition);
                AppendedDefinition::new(&mut definitions[index])
            }
        })
    }

    /// Creates a group definition.
    ///
    /// # Errors
    ///
    /// See [`MetricBuilder::definition`].
    pub fn category(&mut self, name: impl Into<String>) -> Result<AppendedDefinition<'_>> {
        self.definition(name, "array")
    }

    /// Creates a byte-size definition.
    ///
    /// # Errors
    ///
    /// See [`MetricBuilder::definition`].
    pub fn byte_metric(&mut self, name: impl Into<String>) -> Result<AppendedDefinition<'_>> {
        self.definition(name, "bytes")
    }

    /// Creates a percentage definition.
    ///
    /// # Errors
    ///
    /// See [`MetricBuilder::definition`].
    pub fn percentage_metric(
        &mut self,
        name: impl Into<String>,
    ) -> Result<AppendedDefinition<'_>> {
        self.definition(name, "percentage")
    }

    /// Creates a script-count definition.
    ///
    /// # Errors
    ///
    /// See [`MetricBuilder::definition`].
    pub fn scripts_metric(&mut self, name: impl Into<String>) -> Result<AppendedDefinition<'_>> {
        self.definition(name, "scripts")
    }

    /// Returns the definitions collected by a detached builder.
    ///
    /// Builders with a parent already appended everything into it and return
    /// an empty list.
    #[must_use]
    pub fn into_definitions(self) -> Vec<MetricDefinition> {
        match self.target {
            Target::Detached(definitions) => definitions,
            Target::Parent(_) => Vec::new(),
        }
    }
}

fn default_mapping() -> BTreeMap<String, DefinitionFactory> {
    let mut mapping: BTreeMap<String, DefinitionFactory> = BTreeMap::new();
    mapping.insert("array".to_owned(), MetricDefinition::array);
    mapping.insert("bytes".to_owned(), MetricDefinition::byte);
    mapping.insert("percentage".to_owned(), MetricDefinition::percentage);
    mapping.insert("scripts".to_owned(), MetricDefinition::scripts);
    mapping
}
