//! Storage trait definitions for the API storage backends.

use super::StorageError;
use crate::models::{DocumentMeta, Form, FormResponse, Role, SavedQuestion, User};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Forms,
    Questions,
    Responses,
    Roles,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Forms => "forms",
            Collection::Questions => "questions",
            Collection::Responses => "responses",
            Collection::Roles => "roles",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw document as held by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub version: i32,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage backend trait for document operations.
///
/// Backends are schemaless: they persist JSON values per collection and
/// own the `version` counter used for compare-and-swap updates.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Get a document by id
    async fn get_document(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StorageError>;

    /// List every document in a collection
    async fn list_documents(
        &self,
        collection: Collection,
    ) -> Result<Vec<StoredDocument>, StorageError>;

    /// Insert a new document. The backend stamps version 1.
    async fn insert_document(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<StoredDocument, StorageError>;

    /// Replace a document's data, bumping its version.
    ///
    /// When `expected_version` is set the replace only succeeds if the
    /// stored version still matches.
    async fn replace_document(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
        expected_version: Option<i32>,
    ) -> Result<StoredDocument, StorageError>;

    /// Delete a document. Returns false when it did not exist.
    async fn delete_document(&self, collection: Collection, id: Uuid)
    -> Result<bool, StorageError>;

    /// Cheap connectivity probe for health checks
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A typed entity persisted in one collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Singular name used in error messages.
    const ENTITY: &'static str;

    fn meta(&self) -> &DocumentMeta;
    fn meta_mut(&mut self) -> &mut DocumentMeta;
}

macro_rules! impl_document {
    ($ty:ty, $collection:expr, $entity:literal) => {
        impl Document for $ty {
            const COLLECTION: Collection = $collection;
            const ENTITY: &'static str = $entity;

            fn meta(&self) -> &DocumentMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut DocumentMeta {
                &mut self.meta
            }
        }
    };
}

impl_document!(Form, Collection::Forms, "form");
impl_document!(SavedQuestion, Collection::Questions, "question");
impl_document!(FormResponse, Collection::Responses, "response");
impl_document!(Role, Collection::Roles, "role");
impl_document!(User, Collection::Users, "user");
