//! Database schema definitions
//!
//! The record table is a plain key/value table whose name comes from the
//! configuration, so the DDL is built per table rather than kept static.

use rusqlite::Connection;

/// Connection pragmas applied to file-backed databases
pub const FILE_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA temp_store = MEMORY;
";

/// Builds the DDL for a record table
///
/// `table` must already have been validated as a plain identifier.
pub fn record_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            key TEXT PRIMARY KEY NOT NULL,
            value BLOB NOT NULL
        );"
    )
}

/// Creates the record table if it doesn't exist
/// Whether `table` can be spliced into SQL as an identifier
///
/// Accepts ASCII alphanumerics and underscores, not starting with a digit.
pub fn is_valid_table_name(table: &str) -> bool {
    !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn initialize_schema(conn: &Connection, table: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&record_table_sql(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initialization() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn, "urls").unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'urls'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn, "urls").unwrap();
        initialize_schema(&conn, "urls").unwrap();
    }
}
