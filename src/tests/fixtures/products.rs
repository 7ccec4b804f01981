// Shared test fixture for product create/update bodies.

use crate::modules::products::core::product::ProductInput;

const PRODUCT_INPUT_JSON: &str = include_str!("json/product_input.json");

pub struct ProductInputBuilder {
    inner: ProductInput,
}

impl Default for ProductInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl ProductInputBuilder {
    pub fn new() -> Self {
        Self {
            inner: serde_json::from_str(PRODUCT_INPUT_JSON).unwrap(),
        }
    }

    pub fn name(mut self, v: impl Into<String>) -> Self {
        self.inner.name = v.into();
        self
    }

    pub fn quantity(mut self, v: i64) -> Self {
        self.inner.quantity = v;
        self
    }

    pub fn unit(mut self, v: impl Into<String>) -> Self {
        self.inner.unit = v.into();
        self
    }

    pub fn expiry_date(mut self, v: Option<String>) -> Self {
        self.inner.expiry_date = v;
        self
    }

    pub fn build(self) -> ProductInput {
        self.inner
    }
}

#[cfg(test)]
mod product_input_builder_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn default_delegates_to_new_and_parses_json() {
        let built = ProductInputBuilder::default().build();
        assert_eq!(built.name, "Milk");
        assert_eq!(built.quantity, 2);
        assert_eq!(built.unit, "l");
        assert_eq!(built.expiry_date.as_deref(), Some("2024-12-31"));
    }

    #[rstest]
    fn setters_override_all_fields() {
        let custom = ProductInputBuilder::new()
            .name("Rice")
            .quantity(5)
            .unit("kg")
            .expiry_date(None)
            .build();

        assert_eq!(custom.name, "Rice");
        assert_eq!(custom.quantity, 5);
        assert_eq!(custom.unit, "kg");
        assert_eq!(custom.expiry_date, None);
    }
}
