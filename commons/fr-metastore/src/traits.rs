use crate::error::StoreError;
use async_trait::async_trait;
use fr_models::FunctionDefinition;

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable record of function definitions keyed by function name.
#[async_trait]
pub trait MetaStore: Send + Sync {
    /// Inserts or fully overwrites the record for `definition.name`.
    /// Invalid definitions are rejected before anything is written.
    async fn put(&self, definition: &FunctionDefinition) -> StoreResult<()>;

    /// Fails with [`StoreError::NotFound`] when no record exists, which
    /// callers treat as "no cached metadata".
    async fn get(&self, name: &str) -> StoreResult<FunctionDefinition>;

    /// Fails with [`StoreError::NotFound`] when no record exists.
    async fn delete(&self, name: &str) -> StoreResult<()>;
}

pub(crate) fn ensure_valid(definition: &FunctionDefinition) -> StoreResult<()> {
    if definition.is_valid() {
        Ok(())
    } else {
        Err(StoreError::InvalidDefinition(format!(
            "name and image are required (name={:?}, image={:?})",
            definition.name, definition.image
        )))
    }
}
