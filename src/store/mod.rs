//! Storage module for persisting URL records
//!
//! This module handles the key-value persistence the service relies on:
//! - The `RecordStore` trait consumed by the ingestion pool and rescan scheduler
//! - A SQLite-backed implementation with a configurable table

mod schema;
mod sqlite;
mod traits;

pub use schema::is_valid_table_name;
pub use sqlite::SqliteRecordStore;
pub use traits::{RecordStore, StorageError, StorageResult};

use std::path::Path;

/// Opens the configured record store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
/// * `table` - Table (bucket) holding the records
pub fn open_store(path: &Path, table: &str) -> StorageResult<SqliteRecordStore> {
    SqliteRecordStore::open(path, table)
}
