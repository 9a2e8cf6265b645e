use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{DataEntryState, RunPhase};

/// A reusable definition of one workflow step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TaskTemplate {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub product_input_type_id: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An inventory input consumed per product when a task runs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TaskInputField {
    pub id: String,
    pub task_template_id: String,
    pub label: String,
    pub item_type_id: String,
    pub amount: f64,
    pub amount_measure_id: Option<String>,
    pub position: u32,
}

/// An ordered list of task templates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub task_template_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// One execution of a sequence of tasks against a set of products.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub name: String,
    pub identifier: String,
    pub current_task: u32,
    pub has_started: bool,
    pub task_in_progress: bool,
    pub is_active: bool,
    pub task_run_identifier: Option<String>,
    pub started_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Run {
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        RunPhase::from_flags(self.has_started, self.task_in_progress, self.is_active)
    }
}

/// A recorded result for one product at one task step of a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DataEntry {
    pub id: String,
    pub run_id: String,
    pub task_template_id: String,
    pub product_id: String,
    pub item_id: Option<String>,
    pub task_run_identifier: String,
    pub state: DataEntryState,
    pub data: serde_json::Value,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
