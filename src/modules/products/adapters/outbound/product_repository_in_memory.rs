// In memory product repository, also serving the product queries.
//
// Purpose
// - Back the Product API in development and tests without a database.
//
// Responsibilities
// - Assign ids from 1 upward, never reusing one.
// - Answer listings through the shared `ListQuery` filter and ordering.

use crate::modules::products::adapters::outbound::product_repository::ProductRepository;
use crate::modules::products::core::listing::ListQuery;
use crate::modules::products::core::product::{Product, ProductDraft};
use crate::modules::products::use_cases::list_products::queries_port::ProductQueries;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct ProductTable {
    rows: BTreeMap<i64, Product>,
    last_id: i64,
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    table: RwLock<ProductTable>,
    is_offline: bool,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }

    fn ensure_online(&self) -> anyhow::Result<()> {
        if self.is_offline {
            return Err(anyhow::anyhow!("Product repository offline"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, draft: ProductDraft) -> anyhow::Result<Product> {
        self.ensure_online()?;
        let mut table = self.table.write().await;
        table.last_id += 1;
        let product = Product::from_draft(table.last_id, draft);
        table.rows.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: i64, draft: ProductDraft) -> anyhow::Result<Option<Product>> {
        self.ensure_online()?;
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|row| {
            *row = Product::from_draft(id, draft);
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        self.ensure_online()?;
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl ProductQueries for InMemoryProductRepository {
    async fn list(&self, query: &ListQuery, today: NaiveDate) -> anyhow::Result<Vec<Product>> {
        self.ensure_online()?;
        let rows: Vec<Product> = self.table.read().await.rows.values().cloned().collect();
        Ok(query.apply(rows, today))
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<Product>> {
        self.ensure_online()?;
        Ok(self.table.read().await.rows.get(&id).cloned())
    }
}
