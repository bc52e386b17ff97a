//! redb-backed key-value store.
//!
//! redb is a save file: the services load what they need once and then
//! write the whole value back on every mutation. One table, string keys,
//! JSON string values.

use async_trait::async_trait;
use redb::{backends::InMemoryBackend, Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
#[cfg(feature = "profile")]
use std::time::Instant;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

const KV: TableDefinition<&str, &str> = TableDefinition::new("kv");

/// Thin handle to the redb file. Cloneable (Arc inside).
#[derive(Clone)]
pub struct SaveFile {
    db: Arc<Database>,
}

impl SaveFile {
    /// Open (or create) the save file at the given path.
    /// Creates the table if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// A save file that lives only as long as this handle and its clones.
    pub fn in_memory() -> Result<Self, StorageError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, StorageError> {
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(KV)?;
        }
        txn.commit()?;
        Ok(SaveFile { db: Arc::new(db) })
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV)?;
        let value = table.get(key)?.map(|v| v.value().to_string());
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        #[cfg(feature = "profile")]
        let start = Instant::now();
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        #[cfg(feature = "profile")]
        tracing::debug!(key, bytes = value.len(), elapsed_us = start.elapsed().as_micros() as u64, "save file write committed");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Every key currently in the file, in key order.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV)?;
        let mut keys = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

// redb is synchronous; keep it off the async worker threads.
#[async_trait]
impl KeyValueStore for SaveFile {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let this = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || this.read(&key)).await?
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let this = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || this.write(&key, &value)).await?
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let this = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || this.delete(&key)).await?
    }
}

// ── Tests ──────────────────────────────────────────────────────
