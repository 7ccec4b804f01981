use crate::modules::products::adapters::outbound::product_repository::ProductRepository;
use crate::modules::products::core::product::{Product, ProductInput};
use crate::modules::products::use_cases::errors::ApplicationError;
use std::sync::Arc;

/// Full replacement of a product's fields.
pub struct UpdateProductHandler<TRepository>
where
    TRepository: ProductRepository + 'static,
{
    repository: Arc<TRepository>,
}

impl<TRepository> UpdateProductHandler<TRepository>
where
    TRepository: ProductRepository + 'static,
{
    pub fn new(repository: Arc<TRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, id: i64, input: ProductInput) -> Result<Product, ApplicationError> {
        let draft = input.validate().map_err(ApplicationError::Validation)?;
        let product = self
            .repository
            .update(id, draft)
            .await?
            .ok_or(ApplicationError::NotFound(id))?;
        tracing::info!(product_id = id, "product updated");
        Ok(product)
    }
}
