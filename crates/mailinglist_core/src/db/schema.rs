//! Idempotent creation of the `emails` table.
//!
//! There is a single table and no versioned migrations; the DDL uses
//! `IF NOT EXISTS` so bootstrapping an existing database is a no-op.

use crate::db::DbResult;
use rusqlite::Connection;

/// Table holding one row per email address.
pub const EMAILS_TABLE: &str = "emails";

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Creates the `emails` table when it does not exist yet.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Returns whether the `emails` table is present on this connection.
pub fn emails_table_exists(conn: &Connection) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [EMAILS_TABLE],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
