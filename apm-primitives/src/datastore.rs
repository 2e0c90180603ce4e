//! Datastore descriptors used for transaction segments.

use serde::{Deserialize, Serialize};

/// Describes the persistence backend a datastore segment talks to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datastore {
    product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection: Option<String>,
    operation: String,
}

impl Datastore {
    /// Creates a descriptor for `operation` against `database` on `product`.
    #[must_use]
    pub fn new(
        product: impl Into<String>,
        database: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            host: None,
            database: database.into(),
            collection: None,
            operation: operation.into(),
        }
    }

    /// Sets the host serving the datastore.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the collection (table) the operation targets.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Datastore product, e.g. `MySQL`.
    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Host serving the datastore, when known.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Collection (table) name, when known.
    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Operation name, e.g. `select`.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

/// Optional query details recorded with a datastore segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_query_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_query: Option<String>,
}

impl SegmentQuery {
    /// Creates an empty query description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query text.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the label of the input query (e.g. the ORM query language).
    #[must_use]
    pub fn with_input_query_label(mut self, label: impl Into<String>) -> Self {
        self.input_query_label = Some(label.into());
        self
    }

    /// Sets the input query the actual query was generated from.
    #[must_use]
    pub fn with_input_query(mut self, input_query: impl Into<String>) -> Self {
        self.input_query = Some(input_query.into());
        self
    }

    /// Query text, when set.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Input query label, when set.
    #[must_use]
    pub fn input_query_label(&self) -> Option<&str> {
        self.input_query_label.as_deref()
    }

    /// Input query, when set.
    #[must_use]
    pub fn input_query(&self) -> Option<&str> {
        self.input_query.as_deref()
    }
}
