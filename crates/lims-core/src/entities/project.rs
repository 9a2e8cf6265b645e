use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::DeadlineStatus;

/// Lookup row for product progress (`Added`, `Submitted`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProductStatus {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl ProductStatus {
    pub const ADDED: &'static str = "Added";
    pub const SUBMITTED: &'static str = "Submitted";
    pub const RECEIVED: &'static str = "Received";
    pub const IN_PROGRESS: &'static str = "In Progress";

    /// The fixed seed set, in display order.
    pub const DEFAULTS: [&'static str; 4] =
        [Self::ADDED, Self::SUBMITTED, Self::RECEIVED, Self::IN_PROGRESS];
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub identifier: String,
    pub description: Option<String>,
    pub primary_lab_contact: Option<String>,
    pub crm_project_id: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub deadline_warn: Option<DateTime<Utc>>,
    pub deadline_status: DeadlineStatus,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A deliverable of a project that flows through runs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub identifier: String,
    pub project_id: String,
    pub product_type_id: Option<String>,
    pub status_id: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Links a product to an inventory item it is made from or stored as.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProjectLink {
    pub id: String,
    pub product_id: String,
    pub item_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProductAttachment {
    pub id: String,
    pub product_id: String,
    pub file_name: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}
