//! Item update builder.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_measure_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_inventory: Option<bool>,
}

pub struct ItemUpdateBuilder(ItemUpdate);

impl ItemUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ItemUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn barcode(mut self, barcode: Option<String>) -> Self {
        self.0.barcode = Some(barcode);
        self
    }

    #[must_use]
    pub fn item_type_id(mut self, item_type_id: impl Into<String>) -> Self {
        self.0.item_type_id = Some(item_type_id.into());
        self
    }

    #[must_use]
    pub fn location_id(mut self, location_id: Option<String>) -> Self {
        self.0.location_id = Some(location_id);
        self
    }

    #[must_use]
    pub fn amount_measure_id(mut self, amount_measure_id: Option<String>) -> Self {
        self.0.amount_measure_id = Some(amount_measure_id);
        self
    }

    #[must_use]
    pub const fn in_inventory(mut self, in_inventory: bool) -> Self {
        self.0.in_inventory = Some(in_inventory);
        self
    }

    #[must_use]
    pub fn build(self) -> ItemUpdate {
        self.0
    }
}

impl Default for ItemUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
