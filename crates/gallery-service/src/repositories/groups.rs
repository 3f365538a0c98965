//! Groups repository.
//!
//! Groups are keyed by a server-generated UUID in the `id` attribute.

use crate::models::GROUP_ID;
use crate::store::{DocumentStore, Item, Key, StoreError, TableSchema};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

/// Schema of the groups table.
pub fn groups_table(name: &str) -> TableSchema {
    TableSchema::new(name, GROUP_ID)
}

/// Repository for group operations.
pub struct GroupsRepository<'a> {
    store: &'a dyn DocumentStore,
    table: &'a TableSchema,
}

impl<'a> GroupsRepository<'a> {
    pub fn new(store: &'a dyn DocumentStore, table: &'a TableSchema) -> Self {
        Self { store, table }
    }

    /// Store a new group built from client attributes.
    ///
    /// The generated `id` replaces any client-supplied `id`.
    #[instrument(skip_all, name = "gallery.repositories.groups.create")]
    pub async fn create(&self, attributes: Item) -> Result<Item, StoreError> {
        let mut group = attributes;
        group.insert(
            GROUP_ID.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );

        self.store.put(self.table, group.clone()).await?;
        Ok(group)
    }

    /// Every stored group.
    #[instrument(skip_all, name = "gallery.repositories.groups.list")]
    pub async fn list(&self) -> Result<Vec<Item>, StoreError> {
        self.store.scan(self.table).await
    }

    /// Whether a group with this ID exists.
    #[instrument(skip_all, name = "gallery.repositories.groups.exists", fields(group_id = %group_id))]
    pub async fn exists(&self, group_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(self.table, &Key::partition(group_id))
            .await?
            .is_some())
    }

    /// Delete a group; deleting a missing group succeeds.
    #[instrument(skip_all, name = "gallery.repositories.groups.delete", fields(group_id = %group_id))]
    pub async fn delete(&self, group_id: &str) -> Result<(), StoreError> {
        self.store.delete(self.table, &Key::partition(group_id)).await
    }
}
