//! PostgreSQL document store.
//!
//! Every table lives in one `documents` relation keyed by
//! `(table_name, pk, sk)` with the item as JSONB. Secondary index queries
//! filter on the JSONB attribute.
//!
//! # Security
//!
//! - All values are bound parameters; only the sort direction is spliced
//!   into SQL, and it comes from a fixed pair of literals

use super::{DocumentStore, Item, Key, Query, StoreError, TableSchema};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::instrument;

/// Document store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and apply pending migrations.
    ///
    /// # Errors
    ///
    /// `StoreError::Backend` if the connection or a migration fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&add_query_timeout(database_url, 5))
            .await?;

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Adds statement_timeout to the database URL.
fn add_query_timeout(url: &str, timeout_secs: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}

fn direction(descending: bool) -> &'static str {
    if descending {
        "DESC"
    } else {
        "ASC"
    }
}

fn into_items(rows: Vec<Value>) -> Vec<Item> {
    rows.into_iter()
        .filter_map(|row| match row {
            Value::Object(item) => Some(item),
            _ => None,
        })
        .collect()
}

#[async_trait::async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip_all, name = "gallery.store.get", fields(table = %table.name))]
    async fn get(&self, table: &TableSchema, key: &Key) -> Result<Option<Item>, StoreError> {
        let row: Option<Value> = sqlx::query_scalar(
            r#"
            SELECT body
            FROM documents
            WHERE table_name = $1 AND pk = $2 AND sk = $3
            "#,
        )
        .bind(&table.name)
        .bind(&key.partition)
        .bind(key.sort.as_deref().unwrap_or(""))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|body| match body {
            Value::Object(item) => Some(item),
            _ => None,
        }))
    }

    #[instrument(skip_all, name = "gallery.store.put", fields(table = %table.name))]
    async fn put(&self, table: &TableSchema, item: Item) -> Result<(), StoreError> {
        let key = table.key_of(&item)?;

        sqlx::query(
            r#"
            INSERT INTO documents (table_name, pk, sk, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (table_name, pk, sk) DO UPDATE SET body = EXCLUDED.body
            "#,
        )
        .bind(&table.name)
        .bind(&key.partition)
        .bind(key.sort.as_deref().unwrap_or(""))
        .bind(Value::Object(item))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip_all, name = "gallery.store.delete", fields(table = %table.name))]
    async fn delete(&self, table: &TableSchema, key: &Key) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM documents
            WHERE table_name = $1 AND pk = $2 AND sk = $3
            "#,
        )
        .bind(&table.name)
        .bind(&key.partition)
        .bind(key.sort.as_deref().unwrap_or(""))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip_all, name = "gallery.store.query", fields(table = %table.name))]
    async fn query(&self, table: &TableSchema, query: &Query) -> Result<Vec<Item>, StoreError> {
        let (partition_attr, sort_attr) = table.query_keys(query.index.as_deref())?;
        let order = direction(query.descending);

        let rows: Vec<Value> = if query.index.is_none() {
            let sql = format!(
                "SELECT body FROM documents WHERE table_name = $1 AND pk = $2 ORDER BY sk {}",
                order
            );
            sqlx::query_scalar(&sql)
                .bind(&table.name)
                .bind(&query.partition_value)
                .fetch_all(&self.pool)
                .await?
        } else {
            let sql = format!(
                "SELECT body FROM documents \
                 WHERE table_name = $1 AND body->>$2 = $3 \
                 ORDER BY body->>$4 {}, pk, sk",
                order
            );
            sqlx::query_scalar(&sql)
                .bind(&table.name)
                .bind(partition_attr)
                .bind(&query.partition_value)
                .bind(sort_attr.unwrap_or(partition_attr))
                .fetch_all(&self.pool)
                .await?
        };

        Ok(into_items(rows))
    }

    #[instrument(skip_all, name = "gallery.store.scan", fields(table = %table.name))]
    async fn scan(&self, table: &TableSchema) -> Result<Vec<Item>, StoreError> {
        let rows: Vec<Value> = sqlx::query_scalar(
            r#"
            SELECT body
            FROM documents
            WHERE table_name = $1
            ORDER BY created_at, pk, sk
            "#,
        )
        .bind(&table.name)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_items(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_query_timeout() {
        assert_eq!(
            add_query_timeout("postgresql://localhost/gallery", 5),
            "postgresql://localhost/gallery?options=-c%20statement_timeout%3D5s"
        );
        assert_eq!(
            add_query_timeout("postgresql://localhost/gallery?sslmode=require", 5),
            "postgresql://localhost/gallery?sslmode=require&options=-c%20statement_timeout%3D5s"
        );
    }

    #[test]
    fn test_direction() {
        assert_eq!(direction(true), "DESC");
        assert_eq!(direction(false), "ASC");
    }

    #[test]
    fn test_into_items_skips_non_objects() {
        let items = into_items(vec![json!({"id": "a"}), json!("scalar"), json!({"id": "b"})]);
        assert_eq!(items.len(), 2);
    }
}
