//! Typed audit detail payloads.
//!
//! Each audit action can carry a structured `detail` JSON blob. These types
//! give the common shapes a schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Detail for `AuditAction::StatusChanged`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub from: String,
    pub to: String,
    pub reason: Option<String>,
}

/// Detail for `AuditAction::Linked` and `AuditAction::Unlinked`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkedDetail {
    pub source_type: String,
    pub source_id: String,
    pub target_type: String,
    pub target_id: String,
}

/// Detail for `AuditAction::Taken`, `Completed`, and `Reversed` on transfers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StockMovedDetail {
    pub item_id: String,
    pub amount: f64,
    pub is_addition: bool,
    pub amount_available: f64,
}

/// Detail for run task lifecycle actions (`Started`, `Finished`, `Stopped`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TaskRunDetail {
    pub task_run_identifier: String,
    pub task_template_id: String,
    pub position: u32,
    pub repeat: bool,
}

/// Detail for `AuditAction::Synced` on CRM mirror rows.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SyncedDetail {
    pub crm_id: String,
    pub inserted: bool,
}
