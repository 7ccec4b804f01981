use crate::modules::products::core::product::{Product, ProductDraft};
use async_trait::async_trait;

/// Write side of product storage. Ids are assigned by the repository.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, draft: ProductDraft) -> anyhow::Result<Product>;

    /// `Ok(None)` when no product has the id.
    async fn update(&self, id: i64, draft: ProductDraft) -> anyhow::Result<Option<Product>>;

    /// `Ok(false)` when no product has the id.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}
