use async_trait::async_trait;
use fr_models::FunctionDefinition;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::StoreError;
use crate::traits::{MetaStore, StoreResult, ensure_valid};

/// Non-durable store for tests and local development.
#[derive(Clone, Default)]
pub struct MemoryMetaStore {
    store: Arc<RwLock<HashMap<String, FunctionDefinition>>>,
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl MetaStore for MemoryMetaStore {
    async fn put(&self, definition: &FunctionDefinition) -> StoreResult<()> {
        ensure_valid(definition)?;
        let mut store = self.store.write().await;
        store.insert(definition.name.clone(), definition.clone());
        Ok(())
    }

    async fn get(&self, name: &str) -> StoreResult<FunctionDefinition> {
        let store = self.store.read().await;
        store
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        let mut store = self.store.write().await;
        store
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}
