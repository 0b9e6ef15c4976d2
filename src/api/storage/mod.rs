//! Storage module for the API.
//!
//! Provides an in-memory backend and a PostgreSQL backend behind the
//! `StorageBackend` trait, plus the typed `Repository` used by services.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod traits;

pub use error::StorageError;
pub use memory::MemoryStorageBackend;
pub use postgres::PostgresStorageBackend;
pub use repository::Repository;
pub use traits::{Collection, Document, StorageBackend, StoredDocument};
