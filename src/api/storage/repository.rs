//! Typed CRUD helper shared by every resource.
//!
//! `Repository<T>` is the single parameterized create/read/update/delete
//! layer used for forms, saved questions, responses, roles and users. It
//! converts between typed documents and the backend's JSON rows and keeps
//! the document metadata in sync with what the backend stored.

use super::traits::{Document, StorageBackend, StoredDocument};
use super::StorageError;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Attempts made by [`Repository::modify`] before giving up on a
/// contended document.
const MODIFY_ATTEMPTS: usize = 3;

pub struct Repository<T> {
    backend: Arc<dyn StorageBackend>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            _marker: PhantomData,
        }
    }

    fn decode(stored: StoredDocument) -> Result<T, StorageError> {
        let mut doc: T = serde_json::from_value(stored.data).map_err(|e| {
            StorageError::Serialization(format!("Failed to deserialize {}: {}", T::ENTITY, e))
        })?;
        let meta = doc.meta_mut();
        meta.id = stored.id;
        meta.version = stored.version;
        meta.created_at = stored.created_at;
        meta.updated_at = stored.updated_at;
        Ok(doc)
    }

    fn encode(doc: &T) -> Result<serde_json::Value, StorageError> {
        serde_json::to_value(doc).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize {}: {}", T::ENTITY, e))
        })
    }

    /// Fetch a document, `None` when absent.
    pub async fn find(&self, id: Uuid) -> Result<Option<T>, StorageError> {
        self.backend
            .get_document(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    /// Fetch a document, failing with `NotFound` when absent.
    pub async fn get(&self, id: Uuid) -> Result<T, StorageError> {
        self.find(id)
            .await?
            .ok_or_else(|| StorageError::not_found(T::ENTITY, id))
    }

    /// All documents, newest first. Rows that no longer decode as `T` are
    /// logged and skipped so one bad row cannot hide the rest.
    pub async fn list(&self) -> Result<Vec<T>, StorageError> {
        let mut docs = Vec::new();
        for stored in self.backend.list_documents(T::COLLECTION).await? {
            let id = stored.id;
            match Self::decode(stored) {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!("Skipping undecodable {} {}: {}", T::ENTITY, id, e),
            }
        }
        docs.sort_by(|a, b| b.meta().created_at.cmp(&a.meta().created_at));
        Ok(docs)
    }

    /// Documents matching `predicate`, newest first.
    pub async fn list_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.list().await?.into_iter().filter(|d| predicate(d)).collect())
    }

    /// First document matching `predicate`.
    pub async fn find_where<F>(&self, predicate: F) -> Result<Option<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.list().await?.into_iter().find(|d| predicate(d)))
    }

    /// Insert a new document under its own `meta.id`.
    pub async fn create(&self, doc: T) -> Result<T, StorageError> {
        let data = Self::encode(&doc)?;
        let stored = self
            .backend
            .insert_document(T::COLLECTION, doc.meta().id, data)
            .await?;
        debug!("Created {} {}", T::ENTITY, stored.id);
        Self::decode(stored)
    }

    /// Replace a document. With `expected_version` set this is a
    /// compare-and-swap and fails with `VersionConflict` on mismatch.
    pub async fn update(&self, doc: T, expected_version: Option<i32>) -> Result<T, StorageError> {
        let data = Self::encode(&doc)?;
        let stored = self
            .backend
            .replace_document(T::COLLECTION, doc.meta().id, data, expected_version)
            .await?;
        Self::decode(stored)
    }

    /// Read-modify-write with compare-and-swap, retried a few times when a
    /// concurrent writer wins. `mutate` may run more than once.
    pub async fn modify<F, E>(&self, id: Uuid, mut mutate: F) -> Result<T, E>
    where
        F: FnMut(&mut T) -> Result<(), E>,
        E: From<StorageError>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut doc = self.get(id).await?;
            let version = doc.meta().version;
            mutate(&mut doc)?;
            match self.update(doc, Some(version)).await {
                Ok(updated) => return Ok(updated),
                Err(e) if e.is_version_conflict() && attempt < MODIFY_ATTEMPTS => {
                    debug!(
                        "Version conflict modifying {} {} (attempt {}), retrying",
                        T::ENTITY,
                        id,
                        attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Delete a document. Returns false when it did not exist.
    pub async fn delete(&self, id: Uuid) -> Result<bool, StorageError> {
        self.backend.delete_document(T::COLLECTION, id).await
    }

    /// Delete every document matching `predicate`; returns the count.
    pub async fn delete_where<F>(&self, predicate: F) -> Result<usize, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let mut deleted = 0;
        for doc in self.list_where(predicate).await? {
            if self.delete(doc.meta().id).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
