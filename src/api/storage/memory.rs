//! In-memory storage backend.
//!
//! Used when no `DATABASE_URL` is configured and by the test suite.
//! Holds every collection in a single `RwLock`, so each operation is
//! atomic with respect to the others.

use super::{Collection, StorageBackend, StorageError, StoredDocument};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStorageBackend {
    collections: RwLock<HashMap<Collection, HashMap<Uuid, StoredDocument>>>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorageBackend {
    async fn get_document(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    async fn list_documents(
        &self,
        collection: Collection,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_document(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<StoredDocument, StorageError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.contains_key(&id) {
            return Err(StorageError::Duplicate {
                entity_type: collection.to_string(),
                entity_id: id.to_string(),
            });
        }
        let now = Utc::now();
        let stored = StoredDocument {
            id,
            version: 1,
            data,
            created_at: now,
            updated_at: now,
        };
        docs.insert(id, stored.clone());
        Ok(stored)
    }

    async fn replace_document(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
        expected_version: Option<i32>,
    ) -> Result<StoredDocument, StorageError> {
        let mut collections = self.collections.write().await;
        let current = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(&id))
            .ok_or_else(|| StorageError::not_found(collection.as_str(), id))?;

        if let Some(expected) = expected_version {
            if current.version != expected {
                return Err(StorageError::VersionConflict {
                    entity_type: collection.to_string(),
                    entity_id: id.to_string(),
                    expected_version: expected,
                    current_version: current.version,
                });
            }
        }

        current.version += 1;
        current.data = data;
        current.updated_at = Utc::now();
        Ok(current.clone())
    }

    async fn delete_document(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<bool, StorageError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&collection)
            .map(|docs| docs.remove(&id).is_some())
            .unwrap_or(false))
    }
}
