use crate::modules::products::adapters::outbound::product_repository::ProductRepository;
use crate::modules::products::core::product::{Product, ProductInput};
use crate::modules::products::use_cases::errors::ApplicationError;
use std::sync::Arc;

pub struct CreateProductHandler<TRepository>
where
    TRepository: ProductRepository + 'static,
{
    repository: Arc<TRepository>,
}

impl<TRepository> CreateProductHandler<TRepository>
where
    TRepository: ProductRepository + 'static,
{
    pub fn new(repository: Arc<TRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, input: ProductInput) -> Result<Product, ApplicationError> {
        let draft = input.validate().map_err(ApplicationError::Validation)?;
        let product = self.repository.insert(draft).await?;
        tracing::info!(product_id = product.id, "product created");
        Ok(product)
    }
}
