use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("backend error: {0}")]
    Backend(String),
}

/// Named string records that survive restarts of the client.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub mod file_system;
pub mod in_memory;
pub mod json_slot;
