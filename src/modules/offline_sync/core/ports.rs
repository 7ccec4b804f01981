use crate::modules::products::core::listing::ListQuery;
use crate::modules::products::core::product::{Product, ProductDraft};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("rejected by the server: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("product {0} not found on the server")]
    NotFound(i64),

    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Failures that say nothing about the request itself and may succeed later.
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}

/// The product API as seen from the client.
#[async_trait]
pub trait ProductRemote: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Product>, RemoteError>;
    async fn get(&self, id: i64) -> Result<Product, RemoteError>;
    async fn create(&self, draft: &ProductDraft) -> Result<Product, RemoteError>;
    async fn update(&self, id: i64, draft: &ProductDraft) -> Result<(), RemoteError>;
    async fn delete(&self, id: i64) -> Result<(), RemoteError>;
    /// Cheap reachability check used by the connectivity monitor.
    async fn probe(&self) -> bool;
}
