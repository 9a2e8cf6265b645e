use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::PriceType;

/// A billable service price.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Price {
    pub id: String,
    pub name: String,
    pub code: String,
    pub price: f64,
    pub price_type: PriceType,
    pub created_at: DateTime<Utc>,
}
