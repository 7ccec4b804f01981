// Product entity and the shapes used to create or change one.
//
// Responsibilities
// - `ProductInput` is the raw body a caller submits; `validate` turns it into a `ProductDraft`.
// - `ProductDraft` is always valid and is what repositories and the remote client accept.
// - `ProductPatch` carries partial edits that are laid over an existing product.

use crate::modules::products::core::expiry_date::ExpiryDate;
use serde::{Deserialize, Serialize};

pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_UNIT_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    #[serde(default)]
    pub expiry_date: Option<ExpiryDate>,
}

impl Product {
    pub fn from_draft(id: i64, draft: ProductDraft) -> Self {
        Self {
            id,
            name: draft.name,
            quantity: draft.quantity,
            unit: draft.unit,
            expiry_date: draft.expiry_date,
        }
    }

    /// Locally assigned ids are negative and never reach the server.
    pub fn is_placeholder(&self) -> bool {
        self.id < 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    #[serde(default)]
    pub expiry_date: Option<ExpiryDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

impl ProductInput {
    pub fn validate(&self) -> Result<ProductDraft, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        match name.chars().count() {
            0 => errors.push("Product name is required".to_string()),
            n if n > MAX_NAME_CHARS => errors.push(format!(
                "Product name must be between 1 and {MAX_NAME_CHARS} characters"
            )),
            _ => {}
        }

        let quantity = i32::try_from(self.quantity).ok().filter(|q| *q >= 1);
        if quantity.is_none() {
            errors.push("Quantity must be greater than 0".to_string());
        }

        if self.unit.trim().is_empty() {
            errors.push("Unit is required".to_string());
        } else if self.unit.chars().count() > MAX_UNIT_CHARS {
            errors.push(format!(
                "Unit must be between 1 and {MAX_UNIT_CHARS} characters"
            ));
        }

        let expiry_date = match self
            .expiry_date
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
        {
            None => None,
            Some(raw) => match raw.parse::<ExpiryDate>() {
                Ok(date) => Some(date),
                Err(error) => {
                    errors.push(error.to_string());
                    None
                }
            },
        };

        match quantity {
            Some(quantity) if errors.is_empty() => Ok(ProductDraft {
                name: name.to_string(),
                quantity,
                unit: self.unit.clone(),
                expiry_date,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            quantity: i64::from(product.quantity),
            unit: product.unit.clone(),
            expiry_date: product.expiry_date.map(|date| date.to_string()),
        }
    }
}

/// Partial edit. `expiry_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub expiry_date: Option<Option<String>>,
}

impl ProductPatch {
    pub fn apply_to(&self, base: &Product) -> ProductInput {
        let mut input = ProductInput::from(base);
        if let Some(name) = &self.name {
            input.name = name.clone();
        }
        if let Some(quantity) = self.quantity {
            input.quantity = quantity;
        }
        if let Some(unit) = &self.unit {
            input.unit = unit.clone();
        }
        if let Some(expiry_date) = &self.expiry_date {
            input.expiry_date = expiry_date.clone();
        }
        input
    }
}
