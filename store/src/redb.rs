//! Redb-based persistent store implementation.

use std::path::Path;

use ::redb::{Database, ReadableTable, TableDefinition};

use crate::{LocalStore, StoreError, StoreResult};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("session");

/// A persistent store backed by redb.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path).map_err(|e| StoreError::Backend(e.to_string()))?;

        // Create the table if it doesn't exist
        let tx = db
            .begin_write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        {
            let _ = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { db })
    }
}

impl LocalStore for RedbStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let table = tx
            .open_table(TABLE)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match table
            .get(key)
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            table
                .remove(key)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use tempfile::tempdir;

    #[test]
    fn test_redb_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("session.redb")).unwrap();

        store.set(keys::TOKEN, b"tok-abc").unwrap();
        assert_eq!(store.get(keys::TOKEN).unwrap(), Some(b"tok-abc".to_vec()));

        store.delete(keys::TOKEN).unwrap();
        assert_eq!(store.get(keys::TOKEN).unwrap(), None);
    }

    #[test]
    fn test_redb_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            store.set(keys::IDENTITY, b"{\"name\":\"a\"}").unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(
            store.get(keys::IDENTITY).unwrap(),
            Some(b"{\"name\":\"a\"}".to_vec())
        );
    }
}
