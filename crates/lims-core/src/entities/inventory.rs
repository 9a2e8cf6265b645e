use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A unit of measure for stock amounts (`ml`, `g`, `item`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AmountMeasure {
    pub id: String,
    pub name: String,
    pub symbol: String,
}

/// A node in the item type hierarchy (e.g. `Reagent > Buffer`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ItemType {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A physical storage location. Locations nest (building > room > freezer > shelf).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub code: String,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row of a flattened, pre-ordered location tree.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LocationNode {
    pub location: Location,
    pub depth: u32,
    /// Names from the root down to this node joined with `/`.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InventorySet {
    pub id: String,
    pub name: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// A stocked inventory item.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub identifier: String,
    pub barcode: Option<String>,
    pub item_type_id: String,
    pub location_id: Option<String>,
    pub amount_available: f64,
    pub amount_measure_id: Option<String>,
    pub in_inventory: bool,
    pub added_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether a removal of `amount` can be served from current stock.
    #[must_use]
    pub fn can_supply(&self, amount: f64) -> bool {
        self.amount_available >= amount
    }
}
