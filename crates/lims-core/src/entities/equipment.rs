use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EquipmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub status: EquipmentStatus,
    pub can_reserve: bool,
    pub location_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Equipment {
    #[must_use]
    pub fn is_reservable(&self) -> bool {
        self.can_reserve && self.status != EquipmentStatus::Retired
    }
}

/// A booking of a device over the half-open interval `[start, end)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EquipmentReservation {
    pub id: String,
    pub equipment_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reserved_for: Option<String>,
    pub reserved_by: Option<String>,
    pub is_confirmed: bool,
    pub checked_in: bool,
    pub created_at: DateTime<Utc>,
}

impl EquipmentReservation {
    #[must_use]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}

/// An instrument output file captured during a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DataFile {
    pub id: String,
    pub run_id: String,
    pub equipment_id: Option<String>,
    pub task_run_identifier: Option<String>,
    pub file_name: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}
