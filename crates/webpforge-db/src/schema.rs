//! Attachment table layout.
//!
//! The store has a single table, so the schema is tracked with SQLite's
//! `user_version` pragma rather than a migrations table. Version 0 is an
//! empty database.

use rusqlite::Connection;
use webpforge_common::{Error, Result};

/// Schema version written by this build.
pub const SCHEMA_VERSION: i32 = 1;

const ATTACHMENTS_SQL: &str = include_str!("sql/attachments.sql");

/// Read the `user_version` of the database behind `conn`.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| Error::database(format!("Failed to read schema version: {}", e)))
}

/// Create the attachments table on an empty database.
///
/// Opening a database written by a newer build fails instead of guessing at
/// its layout. Returns whether the table was created.
pub fn ensure_schema(conn: &Connection) -> Result<bool> {
    let version = schema_version(conn)?;
    if version == SCHEMA_VERSION {
        return Ok(false);
    }
    if version > SCHEMA_VERSION {
        return Err(Error::database(format!(
            "Metadata database has schema version {}, this build supports {}",
            version, SCHEMA_VERSION
        )));
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;
    tx.execute_batch(ATTACHMENTS_SQL)
        .and_then(|_| tx.pragma_update(None, "user_version", SCHEMA_VERSION))
        .map_err(|e| Error::database(format!("Failed to create attachments table: {}", e)))?;
    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    tracing::debug!("Created attachments table (schema version {})", SCHEMA_VERSION);
    Ok(true)
}
