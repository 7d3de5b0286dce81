//! SQLite-backed [`MetadataProvider`].

use std::path::Path;

use webpforge_common::{AttachmentMetadata, MetadataProvider, Result};

use crate::pool::{get_conn, init_memory_pool, init_pool, DbPool};
use crate::queries::attachments;

/// Attachment metadata stored in a SQLite database.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    pool: DbPool,
}

impl SqliteMetadataStore {
    /// Open (creating and migrating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = init_pool(&path.as_ref().to_string_lossy())?;
        Ok(Self { pool })
    }

    /// Create a store backed by a fresh in-memory database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            pool: init_memory_pool()?,
        })
    }

    /// Store or replace the record for `relative_path`.
    pub fn upsert(&self, relative_path: &str, metadata: &AttachmentMetadata) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        attachments::upsert_metadata(&conn, relative_path, metadata)
    }

    /// Remove the record for `relative_path`, returning whether one existed.
    pub fn remove(&self, relative_path: &str) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        attachments::delete_metadata(&conn, relative_path)
    }

    /// Store every `(relative_path, metadata)` pair in one transaction.
    pub fn import<I>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, AttachmentMetadata)>,
    {
        let conn = get_conn(&self.pool)?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| webpforge_common::Error::database(e.to_string()))?;

        let mut count = 0;
        for (relative_path, metadata) in records {
            attachments::upsert_metadata(&tx, &relative_path, &metadata)?;
            count += 1;
        }

        tx.commit()
            .map_err(|e| webpforge_common::Error::database(e.to_string()))?;

        tracing::info!("Imported {} attachment metadata records", count);
        Ok(count)
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<i64> {
        let conn = get_conn(&self.pool)?;
        attachments::count_attachments(&conn)
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl MetadataProvider for SqliteMetadataStore {
    fn lookup(&self, relative_path: &str) -> Result<Option<AttachmentMetadata>> {
        let conn = get_conn(&self.pool)?;
        attachments::get_metadata(&conn, relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpforge_common::SizeSpec;

    #[test]
    fn test_lookup_through_trait() {
        let store = SqliteMetadataStore::in_memory().unwrap();
        let mut meta = AttachmentMetadata::default();
        meta.sizes.insert(
            "medium".to_string(),
            SizeSpec {
                file: "b-300x200.png".to_string(),
                width: 300,
                height: 200,
            },
        );
        store.upsert("2023/01/b.png", &meta).unwrap();

        let provider: &dyn MetadataProvider = &store;
        assert_eq!(provider.lookup("2023/01/b.png").unwrap(), Some(meta));
        assert_eq!(provider.lookup("2023/01/c.png").unwrap(), None);
    }

    #[test]
    fn test_import_and_remove() {
        let store = SqliteMetadataStore::in_memory().unwrap();
        assert!(store.is_empty().unwrap());

        let imported = store
            .import(vec![
                ("a.jpg".to_string(), AttachmentMetadata::default()),
                ("b.jpg".to_string(), AttachmentMetadata::default()),
            ])
            .unwrap();
        assert_eq!(imported, 2);
        assert_eq!(store.len().unwrap(), 2);

        assert!(store.remove("a.jpg").unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }
}
