use crate::modules::products::core::product::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product as the client keeps it locally, with the bookkeeping the server never sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedProduct {
    #[serde(flatten)]
    pub product: Product,
    /// Carries edits the server has not confirmed yet.
    #[serde(rename = "_offline", default)]
    pub offline: bool,
    #[serde(rename = "_createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CachedProduct {
    pub fn confirmed(product: Product) -> Self {
        Self {
            product,
            offline: false,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn offline_created(product: Product, at: DateTime<Utc>) -> Self {
        Self {
            product,
            offline: true,
            created_at: Some(at),
            updated_at: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.product.id
    }
}
