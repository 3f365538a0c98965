//! In-memory document store.
//!
//! Used when no database is configured and by tests. Contents live for the
//! lifetime of the process.

use super::{compare_sort_values, scalar_string, DocumentStore, Item, Key, Query, StoreError, TableSchema};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Document store backed by process memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    tables: RwLock<HashMap<String, BTreeMap<Key, Item>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items in a table.
    pub async fn len(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, BTreeMap::len)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, table: &TableSchema, key: &Key) -> Result<Option<Item>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(&table.name).and_then(|items| items.get(key)).cloned())
    }

    async fn put(&self, table: &TableSchema, item: Item) -> Result<(), StoreError> {
        let key = table.key_of(&item)?;
        let mut tables = self.tables.write().await;
        tables.entry(table.name.clone()).or_default().insert(key, item);
        Ok(())
    }

    async fn delete(&self, table: &TableSchema, key: &Key) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(items) = tables.get_mut(&table.name) {
            items.remove(key);
        }
        Ok(())
    }

    async fn query(&self, table: &TableSchema, query: &Query) -> Result<Vec<Item>, StoreError> {
        let (partition_attr, sort_attr) = table.query_keys(query.index.as_deref())?;

        let tables = self.tables.read().await;
        let mut matches: Vec<Item> = tables
            .get(&table.name)
            .map(|items| {
                items
                    .values()
                    .filter(|item| {
                        item.get(partition_attr).and_then(scalar_string).as_deref()
                            == Some(query.partition_value.as_str())
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort_attr) = sort_attr {
            matches.sort_by(|a, b| compare_sort_values(a.get(sort_attr), b.get(sort_attr)));
        }
        if query.descending {
            matches.reverse();
        }

        Ok(matches)
    }

    async fn scan(&self, table: &TableSchema) -> Result<Vec<Item>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table.name)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }
}
