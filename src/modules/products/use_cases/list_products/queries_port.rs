use crate::modules::products::core::listing::ListQuery;
use crate::modules::products::core::product::Product;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait ProductQueries {
    async fn list(&self, query: &ListQuery, today: NaiveDate) -> anyhow::Result<Vec<Product>>;

    async fn get(&self, id: i64) -> anyhow::Result<Option<Product>>;
}
