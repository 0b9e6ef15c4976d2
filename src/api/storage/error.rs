//! Storage error types for the API storage backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage operation errors.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {entity_id}")]
    NotFound {
        entity_type: String,
        entity_id: String,
    },
    /// Version conflict in optimistic locking
    #[error("Version conflict on {entity_type} {entity_id}: expected {expected_version}, got {current_version}")]
    VersionConflict {
        entity_type: String,
        entity_id: String,
        expected_version: i32,
        current_version: i32,
    },
    /// Entity with the same id already exists
    #[error("Duplicate {entity_type} with id {entity_id}")]
    Duplicate {
        entity_type: String,
        entity_id: String,
    },
    /// Document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Database connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
    /// General storage error
    #[error("Storage error: {0}")]
    Other(String),
}

impl StorageError {
    pub fn not_found(entity_type: &str, entity_id: impl ToString) -> Self {
        StorageError::NotFound {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
        }
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StorageError::VersionConflict { .. })
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}
