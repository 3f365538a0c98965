//! Document store abstraction.
//!
//! Items are schemaless JSON objects kept in named tables. Each table has a
//! partition key, an optional sort key and any number of secondary indexes.
//! Handlers depend only on the [`DocumentStore`] trait; the backend is chosen
//! at startup.

mod memory;
mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

/// A stored document.
pub type Item = Map<String, Value>;

/// Document store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An item lacks one of the table's key attributes, or it is not a scalar.
    #[error("Item is missing key attribute '{0}'")]
    MissingKey(String),

    /// A query named an index the table does not declare.
    #[error("Unknown index '{index}' on table '{table}'")]
    UnknownIndex { table: String, index: String },

    /// The backing database failed.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Secondary index declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
}

/// Table declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
    pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
    /// Table keyed by a partition attribute only.
    pub fn new(name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: None,
            indexes: Vec::new(),
        }
    }

    /// Add a sort key attribute.
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Add a secondary index.
    pub fn with_index(
        mut self,
        name: impl Into<String>,
        partition_key: impl Into<String>,
        sort_key: Option<&str>,
    ) -> Self {
        self.indexes.push(IndexSchema {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: sort_key.map(str::to_string),
        });
        self
    }

    /// Primary key of an item.
    ///
    /// # Errors
    ///
    /// `StoreError::MissingKey` if a key attribute is absent or not a scalar.
    pub fn key_of(&self, item: &Item) -> Result<Key, StoreError> {
        let partition = key_attribute(item, &self.partition_key)?;
        let sort = match &self.sort_key {
            Some(attr) => Some(key_attribute(item, attr)?),
            None => None,
        };
        Ok(Key { partition, sort })
    }

    /// Partition and sort attributes a query runs over.
    ///
    /// # Errors
    ///
    /// `StoreError::UnknownIndex` if `index` is not declared.
    pub fn query_keys(&self, index: Option<&str>) -> Result<(&str, Option<&str>), StoreError> {
        match index {
            None => Ok((self.partition_key.as_str(), self.sort_key.as_deref())),
            Some(name) => self
                .indexes
                .iter()
                .find(|idx| idx.name == name)
                .map(|idx| (idx.partition_key.as_str(), idx.sort_key.as_deref()))
                .ok_or_else(|| StoreError::UnknownIndex {
                    table: self.name.clone(),
                    index: name.to_string(),
                }),
        }
    }
}

/// Primary key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub partition: String,
    pub sort: Option<String>,
}

impl Key {
    /// Key for a table without a sort key.
    pub fn partition(value: impl Into<String>) -> Self {
        Self {
            partition: value.into(),
            sort: None,
        }
    }
}

/// Query over one partition of a table or index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Index to query; the table's primary key when `None`.
    pub index: Option<String>,

    /// Partition key value to match.
    pub partition_value: String,

    /// Order by sort key descending.
    pub descending: bool,
}

impl Query {
    /// Ascending query on the table's primary key.
    pub fn partition(value: impl Into<String>) -> Self {
        Self {
            index: None,
            partition_value: value.into(),
            descending: false,
        }
    }

    /// Query a secondary index instead.
    pub fn on_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Newest (highest sort key) first.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }
}

/// Scalar attribute rendered as a key string.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn key_attribute(item: &Item, attr: &str) -> Result<String, StoreError> {
    item.get(attr)
        .and_then(scalar_string)
        .ok_or_else(|| StoreError::MissingKey(attr.to_string()))
}

/// Sort key ordering: numbers numerically, everything else as strings.
/// Items without the attribute sort first.
pub(crate) fn compare_sort_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => scalar_string(x).cmp(&scalar_string(y)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Schemaless document store.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one item by primary key.
    async fn get(&self, table: &TableSchema, key: &Key) -> Result<Option<Item>, StoreError>;

    /// Insert or replace an item.
    async fn put(&self, table: &TableSchema, item: Item) -> Result<(), StoreError>;

    /// Delete an item; deleting a missing item succeeds.
    async fn delete(&self, table: &TableSchema, key: &Key) -> Result<(), StoreError>;

    /// Items of one partition ordered by the sort key.
    async fn query(&self, table: &TableSchema, query: &Query) -> Result<Vec<Item>, StoreError>;

    /// Every item of the table.
    async fn scan(&self, table: &TableSchema) -> Result<Vec<Item>, StoreError>;
}
