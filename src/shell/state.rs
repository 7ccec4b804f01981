use crate::modules::products::adapters::outbound::product_repository_in_memory::InMemoryProductRepository;
use crate::modules::products::use_cases::create_product::handler::CreateProductHandler;
use crate::modules::products::use_cases::delete_product::handler::DeleteProductHandler;
use crate::modules::products::use_cases::list_products::queries_port::ProductQueries;
use crate::modules::products::use_cases::update_product::handler::UpdateProductHandler;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub queries: Arc<dyn ProductQueries + Send + Sync>,
    pub create_handler: Arc<CreateProductHandler<InMemoryProductRepository>>,
    pub update_handler: Arc<UpdateProductHandler<InMemoryProductRepository>>,
    pub delete_handler: Arc<DeleteProductHandler<InMemoryProductRepository>>,
}

impl AppState {
    pub fn new(repository: Arc<InMemoryProductRepository>) -> Self {
        Self {
            queries: repository.clone(),
            create_handler: Arc::new(CreateProductHandler::new(repository.clone())),
            update_handler: Arc::new(UpdateProductHandler::new(repository.clone())),
            delete_handler: Arc::new(DeleteProductHandler::new(repository)),
        }
    }
}
