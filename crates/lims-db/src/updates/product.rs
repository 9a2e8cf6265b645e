//! Product update builder.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type_id: Option<Option<String>>,
}

pub struct ProductUpdateBuilder(ProductUpdate);

impl ProductUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ProductUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn product_type_id(mut self, product_type_id: Option<String>) -> Self {
        self.0.product_type_id = Some(product_type_id);
        self
    }

    #[must_use]
    pub fn build(self) -> ProductUpdate {
        self.0
    }
}

impl Default for ProductUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
