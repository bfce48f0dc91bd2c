use async_trait::async_trait;
use fr_models::FunctionDefinition;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

use crate::traits::{MetaStore, StoreResult, ensure_valid};
use crate::StoreError;

// function name -> JSON encoded FunctionDefinition
const FUNCTIONS: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("functions");

/// Redb-backed metadata store.
///
/// The store starts closed when built with [`RedbMetaStore::unopened`] and
/// fails every operation with [`StoreError::NotInitialized`] until
/// [`RedbMetaStore::open_path`] succeeds, so the composition root decides
/// when the database file is touched.
pub struct RedbMetaStore {
    db: RwLock<Option<Database>>,
}

impl RedbMetaStore {
    pub fn unopened() -> Self {
        Self {
            db: RwLock::new(None),
        }
    }

    /// Open or create the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self::unopened();
        store.open_path(path)?;
        Ok(store)
    }

    pub fn open_path(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let builder = Database::builder();
        let db = if path.exists() {
            builder.open(path).map_err(StoreError::backend)?
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            builder.create(path).map_err(StoreError::backend)?
        };

        // Ensure the table exists to avoid first-read failures
        {
            let wtxn = db.begin_write().map_err(StoreError::backend)?;
            let _ = wtxn.open_table(FUNCTIONS).map_err(StoreError::backend)?;
            wtxn.commit().map_err(StoreError::backend)?;
        }

        let mut guard = self.db.write().map_err(StoreError::backend)?;
        *guard = Some(db);
        info!(path = %path.display(), "metadata store opened");
        Ok(())
    }

    pub fn close(&self) -> StoreResult<()> {
        let mut guard = self.db.write().map_err(StoreError::backend)?;
        if guard.take().is_some() {
            info!("metadata store closed");
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.db.read().map(|g| g.is_some()).unwrap_or(false)
    }

    fn with_db<T>(
        &self,
        f: impl FnOnce(&Database) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let guard = self.db.read().map_err(StoreError::backend)?;
        match guard.as_ref() {
            Some(db) => f(db),
            None => Err(StoreError::NotInitialized),
        }
    }
}

#[async_trait]
impl MetaStore for RedbMetaStore {
    async fn put(&self, definition: &FunctionDefinition) -> StoreResult<()> {
        ensure_valid(definition)?;
        let buf = serde_json::to_vec(definition)?;
        self.with_db(|db| {
            let wtxn = db.begin_write().map_err(StoreError::backend)?;
            {
                let mut table =
                    wtxn.open_table(FUNCTIONS).map_err(StoreError::backend)?;
                table
                    .insert(definition.name.as_str(), buf.as_slice())
                    .map_err(StoreError::backend)?;
            }
            wtxn.commit().map_err(StoreError::backend)?;
            Ok(())
        })?;
        debug!(function = %definition.name, "metadata stored");
        Ok(())
    }

    async fn get(&self, name: &str) -> StoreResult<FunctionDefinition> {
        let buf = self.with_db(|db| {
            let rtxn = db.begin_read().map_err(StoreError::backend)?;
            let table =
                rtxn.open_table(FUNCTIONS).map_err(StoreError::backend)?;
            let value = table.get(name).map_err(StoreError::backend)?;
            Ok(value.map(|v| v.value().to_vec()))
        })?;
        match buf {
            Some(buf) => Ok(serde_json::from_slice(&buf)?),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        let existed = self.with_db(|db| {
            let wtxn = db.begin_write().map_err(StoreError::backend)?;
            let existed = {
                let mut table =
                    wtxn.open_table(FUNCTIONS).map_err(StoreError::backend)?;
                let prev = table.remove(name).map_err(StoreError::backend)?;
                prev.is_some()
            };
            wtxn.commit().map_err(StoreError::backend)?;
            Ok(existed)
        })?;
        if existed {
            debug!(function = %name, "metadata deleted");
            Ok(())
        } else {
            Err(StoreError::NotFound(name.to_string()))
        }
    }
}
