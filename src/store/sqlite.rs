//! SQLite record store implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::store::schema::{initialize_schema, is_valid_table_name, FILE_PRAGMAS};
use crate::store::traits::{RecordStore, StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite record store backend
///
/// Holds a single connection behind a mutex; `None` once disconnected.
pub struct SqliteRecordStore {
    conn: Mutex<Option<Connection>>,
    table: String,
}

impl SqliteRecordStore {
    /// Opens (or creates) a database file and its record table
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `table` - Name of the table holding the records
    pub fn open(path: &Path, table: &str) -> StorageResult<Self> {
        check_table_name(table)?;

        let conn = Connection::open(path)?;
        conn.execute_batch(FILE_PRAGMAS)?;
        initialize_schema(&conn, table)?;

        tracing::debug!("Opened record store {} (table {})", path.display(), table);

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            table: table.to_string(),
        })
    }

    /// Creates an in-memory store
    pub fn open_in_memory(table: &str) -> StorageResult<Self> {
        check_table_name(table)?;

        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn, table)?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Option<Connection>>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl RecordStore for SqliteRecordStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StorageError::Disconnected)?;

        tracing::trace!("Fetching key {} from {}", key, self.table);
        let value = conn
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", self.table),
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StorageError::Disconnected)?;

        conn.execute(
            &format!(
                "INSERT INTO {} (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                self.table
            ),
            params![key, value],
        )?;

        Ok(())
    }

    fn get_all(&self) -> StorageResult<Vec<Vec<u8>>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StorageError::Disconnected)?;

        let mut stmt = conn.prepare(&format!("SELECT value FROM {} ORDER BY key", self.table))?;
        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<Vec<u8>>, _>>()?;

        Ok(values)
    }

    fn disconnect(&self) -> StorageResult<()> {
        let mut guard = self.lock()?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| StorageError::Sqlite(e))?;
            tracing::debug!("Record store disconnected");
        }
        Ok(())
    }
}

fn check_table_name(table: &str) -> StorageResult<()> {
    if is_valid_table_name(table) {
        Ok(())
    } else {
        Err(StorageError::InvalidTableName(table.to_string()))
    }
}
