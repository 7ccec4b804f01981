use crate::modules::products::adapters::outbound::product_repository::ProductRepository;
use crate::modules::products::use_cases::errors::ApplicationError;
use std::sync::Arc;

pub struct DeleteProductHandler<TRepository>
where
    TRepository: ProductRepository + 'static,
{
    repository: Arc<TRepository>,
}

impl<TRepository> DeleteProductHandler<TRepository>
where
    TRepository: ProductRepository + 'static,
{
    pub fn new(repository: Arc<TRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, id: i64) -> Result<(), ApplicationError> {
        if !self.repository.delete(id).await? {
            return Err(ApplicationError::NotFound(id));
        }
        tracing::info!(product_id = id, "product deleted");
        Ok(())
    }
}
