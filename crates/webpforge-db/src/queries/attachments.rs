//! Attachment metadata queries.
//!
//! Records are keyed by the original's storage-relative path and hold the
//! size metadata as a JSON document.

use rusqlite::{Connection, OptionalExtension};
use webpforge_common::{AttachmentMetadata, Error, Result};

/// Insert or replace the metadata for `relative_path`.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `relative_path` - Storage-relative path of the original (e.g. `2024/05/photo.jpg`)
/// * `metadata` - Size metadata to store
pub fn upsert_metadata(
    conn: &Connection,
    relative_path: &str,
    metadata: &AttachmentMetadata,
) -> Result<()> {
    let json = metadata.to_json()?;

    conn.execute(
        "INSERT INTO attachments (relative_path, metadata, updated_at)
         VALUES (:relative_path, :metadata, :updated_at)
         ON CONFLICT(relative_path) DO UPDATE SET
            metadata = excluded.metadata,
            updated_at = excluded.updated_at",
        rusqlite::named_params! {
            ":relative_path": relative_path,
            ":metadata": json,
            ":updated_at": chrono::Utc::now().to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get the metadata for `relative_path`.
///
/// # Returns
///
/// * `Ok(Some(AttachmentMetadata))` - The record if found
/// * `Ok(None)` - If the path is not a tracked attachment
/// * `Err(Error)` - If a database error occurs or the stored JSON is invalid
pub fn get_metadata(conn: &Connection, relative_path: &str) -> Result<Option<AttachmentMetadata>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT metadata FROM attachments WHERE relative_path = :relative_path",
            rusqlite::named_params! { ":relative_path": relative_path },
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))?;

    json.map(|j| AttachmentMetadata::from_json(&j)).transpose()
}

/// Delete the metadata for `relative_path`.
///
/// Returns `true` if a record was removed.
pub fn delete_metadata(conn: &Connection, relative_path: &str) -> Result<bool> {
    let affected = conn
        .execute(
            "DELETE FROM attachments WHERE relative_path = :relative_path",
            rusqlite::named_params! { ":relative_path": relative_path },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(affected > 0)
}

/// Count stored attachment records.
pub fn count_attachments(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM attachments", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}
