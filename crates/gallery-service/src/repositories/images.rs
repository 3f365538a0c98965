//! Images repository.
//!
//! Images are partitioned by `groupId` and sorted by `timestamp`, with a
//! secondary index on `imageId` for direct lookup.

use crate::models::{IMAGE_GROUP_ID, IMAGE_ID, IMAGE_TIMESTAMP, IMAGE_URL};
use crate::store::{DocumentStore, Item, Query, StoreError, TableSchema};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::instrument;

/// Schema of the images table.
pub fn images_table(name: &str, image_id_index: &str) -> TableSchema {
    TableSchema::new(name, IMAGE_GROUP_ID)
        .with_sort_key(IMAGE_TIMESTAMP)
        .with_index(image_id_index, IMAGE_ID, None)
}

/// Current time in the stored timestamp format.
///
/// Fixed millisecond precision with a `Z` suffix keeps timestamps
/// lexicographically ordered.
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Repository for image operations.
pub struct ImagesRepository<'a> {
    store: &'a dyn DocumentStore,
    table: &'a TableSchema,
    image_id_index: &'a str,
}

impl<'a> ImagesRepository<'a> {
    pub fn new(store: &'a dyn DocumentStore, table: &'a TableSchema, image_id_index: &'a str) -> Self {
        Self {
            store,
            table,
            image_id_index,
        }
    }

    /// Store a new image record.
    ///
    /// `imageId`, `groupId`, `timestamp` and `imageUrl` replace any
    /// client-supplied attributes of the same name.
    ///
    /// The primary key is (`groupId`, `timestamp`) at millisecond
    /// resolution: a second image created in the same group within the same
    /// millisecond replaces the first.
    #[instrument(skip_all, name = "gallery.repositories.images.create", fields(group_id = %group_id, image_id = %image_id))]
    pub async fn create(
        &self,
        group_id: &str,
        image_id: &str,
        image_url: String,
        attributes: Item,
    ) -> Result<Item, StoreError> {
        let mut image = attributes;
        image.insert(IMAGE_ID.to_string(), Value::String(image_id.to_string()));
        image.insert(IMAGE_GROUP_ID.to_string(), Value::String(group_id.to_string()));
        image.insert(IMAGE_TIMESTAMP.to_string(), Value::String(current_timestamp()));
        image.insert(IMAGE_URL.to_string(), Value::String(image_url));

        self.store.put(self.table, image.clone()).await?;
        Ok(image)
    }

    /// Images of a group, newest first.
    #[instrument(skip_all, name = "gallery.repositories.images.list_for_group", fields(group_id = %group_id))]
    pub async fn list_for_group(&self, group_id: &str) -> Result<Vec<Item>, StoreError> {
        self.store
            .query(self.table, &Query::partition(group_id).descending())
            .await
    }

    /// Look an image up by ID.
    #[instrument(skip_all, name = "gallery.repositories.images.find_by_id", fields(image_id = %image_id))]
    pub async fn find_by_id(&self, image_id: &str) -> Result<Option<Item>, StoreError> {
        let matches = self
            .store
            .query(
                self.table,
                &Query::partition(image_id).on_index(self.image_id_index),
            )
            .await?;

        Ok(matches.into_iter().next())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;

    fn table() -> TableSchema {
        images_table("images", "image-id-index")
    }

    #[tokio::test]
    async fn test_create_sets_server_fields() {
        let store = MemoryDocumentStore::new();
        let table = table();
        let repo = ImagesRepository::new(&store, &table, "image-id-index");

        let attributes = json!({
            "title": "Sunset",
            "imageId": "spoofed",
            "groupId": "spoofed",
            "timestamp": "1970-01-01T00:00:00.000Z",
            "imageUrl": "https://evil.example.com/x"
        });
        let image = repo
            .create(
                "g1",
                "i1",
                "https://bucket.s3.amazonaws.com/i1".to_string(),
                attributes.as_object().cloned().unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(image["imageId"], "i1");
        assert_eq!(image["groupId"], "g1");
        assert_eq!(image["imageUrl"], "https://bucket.s3.amazonaws.com/i1");
        assert_eq!(image["title"], "Sunset");
        assert_ne!(image["timestamp"], "1970-01-01T00:00:00.000Z");
        assert!(chrono::DateTime::parse_from_rfc3339(image["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_list_for_group_newest_first() {
        let store = MemoryDocumentStore::new();
        let table = table();
        for (id, ts) in [
            ("old", "2024-01-01T00:00:00.000Z"),
            ("new", "2024-03-01T00:00:00.000Z"),
            ("mid", "2024-02-01T00:00:00.000Z"),
        ] {
            store
                .put(
                    &table,
                    json!({"groupId": "g1", "imageId": id, "timestamp": ts})
                        .as_object()
                        .cloned()
                        .unwrap(),
                )
                .await
                .unwrap();
        }
        let repo = ImagesRepository::new(&store, &table, "image-id-index");

        let images = repo.list_for_group("g1").await.unwrap();

        let ids: Vec<&str> = images.iter().map(|i| i["imageId"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert!(repo.list_for_group("g2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = MemoryDocumentStore::new();
        let table = table();
        let repo = ImagesRepository::new(&store, &table, "image-id-index");

        repo.create("g1", "i1", "u".to_string(), Item::new()).await.unwrap();

        let found = repo.find_by_id("i1").await.unwrap().unwrap();
        assert_eq!(found["groupId"], "g1");
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[test]
    fn test_current_timestamp_format() {
        let ts = current_timestamp();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len());
    }
}
