use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A recorded movement of stock into or out of an item.
///
/// A transfer is created first, then *taken* (stock actually moves), then
/// *completed*. `transfer_complete` implies `has_taken`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ItemTransfer {
    pub id: String,
    pub item_id: String,
    pub amount_to_take: f64,
    /// Item stock at creation, then after the move once taken.
    pub amount_available: f64,
    pub amount_measure_id: Option<String>,
    pub is_addition: bool,
    pub run_identifier: Option<String>,
    pub linked_transfer_id: Option<String>,
    pub has_taken: bool,
    pub transfer_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemTransfer {
    /// Signed change this transfer applies to the item's stock.
    #[must_use]
    pub fn delta(&self) -> f64 {
        if self.is_addition {
            self.amount_to_take
        } else {
            -self.amount_to_take
        }
    }
}
