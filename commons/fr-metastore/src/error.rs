#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Function metadata not found: {0}")]
    NotFound(String),

    #[error("Metadata store not initialized")]
    NotInitialized,

    #[error("Invalid function definition: {0}")]
    InvalidDefinition(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend<T: ToString>(msg: T) -> Self {
        Self::Backend(msg.to_string())
    }

    /// Whether retrying the same operation later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Backend(_))
    }
}
