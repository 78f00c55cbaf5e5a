//! Storage traits and error types
//!
//! This module defines the key-value interface the ingestion pool and the
//! rescan scheduler persist URL records through.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Store has been disconnected")]
    Disconnected,

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value store holding serialized URL records keyed by address
///
/// Implementations must be safe to share between the ingestion workers and
/// the rescan scheduler. No read-modify-write atomicity is expected: callers
/// perform `get` then `set` and accept lost updates under concurrent writers
/// to the same key.
pub trait RecordStore: Send + Sync {
    /// Gets the value stored under `key`, or `None` if absent
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Inserts or replaces the value stored under `key`
    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Gets every stored value in store iteration order
    fn get_all(&self) -> StorageResult<Vec<Vec<u8>>>;

    /// Releases the underlying connection
    ///
    /// Every later operation fails with [`StorageError::Disconnected`].
    fn disconnect(&self) -> StorageResult<()>;
}
