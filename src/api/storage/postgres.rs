//! PostgreSQL storage backend implementation.
//!
//! Every collection lives in the single `documents` table keyed by
//! `(collection, id)`. Version checks happen inside the `UPDATE` itself so
//! concurrent writers cannot both succeed.

use super::{Collection, StorageBackend, StorageError, StoredDocument};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// PostgreSQL storage backend implementation.
pub struct PostgresStorageBackend {
    pool: PgPool,
}

impl PostgresStorageBackend {
    /// Create a new PostgreSQL storage backend.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_document(row: PgRow) -> Result<StoredDocument, StorageError> {
        let read = |e: sqlx::Error| StorageError::Other(format!("Failed to read row: {}", e));
        Ok(StoredDocument {
            id: row.try_get::<Uuid, _>("id").map_err(read)?,
            version: row.try_get::<i32, _>("version").map_err(read)?,
            data: row.try_get::<Value, _>("data").map_err(read)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(read)?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(read)?,
        })
    }
}

fn db_error(e: sqlx::Error) -> StorageError {
    StorageError::ConnectionError(e.to_string())
}

#[async_trait]
impl StorageBackend for PostgresStorageBackend {
    async fn get_document(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT id, version, data, created_at, updated_at
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Self::row_to_document).transpose()
    }

    async fn list_documents(
        &self,
        collection: Collection,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, version, data, created_at, updated_at
            FROM documents
            WHERE collection = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn insert_document(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<StoredDocument, StorageError> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, version, created_at, updated_at)
            VALUES ($1, $2, $3, 1, $4, $4)
            ON CONFLICT (collection, id) DO NOTHING
            RETURNING id, version, data, created_at, updated_at
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(&data)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Self::row_to_document(row),
            None => Err(StorageError::Duplicate {
                entity_type: collection.to_string(),
                entity_id: id.to_string(),
            }),
        }
    }

    async fn replace_document(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
        expected_version: Option<i32>,
    ) -> Result<StoredDocument, StorageError> {
        let row = sqlx::query(
            r#"
            UPDATE documents
            SET data = $3, version = version + 1, updated_at = $4
            WHERE collection = $1 AND id = $2
              AND ($5::INT IS NULL OR version = $5)
            RETURNING id, version, data, created_at, updated_at
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(&data)
        .bind(Utc::now())
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        if let Some(row) = row {
            return Self::row_to_document(row);
        }

        // Nothing updated: either the row is gone or its version moved on.
        let current_version: Option<i32> = sqlx::query_scalar(
            "SELECT version FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match (current_version, expected_version) {
            (Some(current_version), Some(expected_version)) => {
                Err(StorageError::VersionConflict {
                    entity_type: collection.to_string(),
                    entity_id: id.to_string(),
                    expected_version,
                    current_version,
                })
            }
            _ => Err(StorageError::not_found(collection.as_str(), id)),
        }
    }

    async fn delete_document(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<bool, StorageError> {
        let rows_affected = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
