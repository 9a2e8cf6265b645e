//! Response types returned by setup routines and the scheduled deadline job,
//! and emitted as JSON by `lims` commands.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{DataEntry, Item, ItemTransfer, LocationNode, Run, User};

/// Result of `bootstrap_default_groups`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BootstrapReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

/// Result of `create_superuser`: a second attempt returns the existing account.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "outcome", content = "user", rename_all = "snake_case")]
pub enum SuperuserOutcome {
    Created(User),
    AlreadyExists(User),
}

impl SuperuserOutcome {
    #[must_use]
    pub const fn user(&self) -> &User {
        match self {
            Self::Created(user) | Self::AlreadyExists(user) => user,
        }
    }

    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Result of one deadline processing pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeadlineReport {
    pub checked: u32,
    pub updated: u32,
    pub notified: u32,
}

/// Response from `lims run start-task`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TaskStartResponse {
    pub run: Run,
    pub task_run_identifier: String,
    pub entries: Vec<DataEntry>,
    pub transfers: Vec<ItemTransfer>,
}

/// Response from `lims run finish-task`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TaskFinishResponse {
    pub run: Run,
    pub entries: Vec<DataEntry>,
    pub transfers: Vec<ItemTransfer>,
}

/// Response from `lims transfer take`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TransferTakeResponse {
    pub transfer: ItemTransfer,
    pub item: Item,
}

/// Response from `lims location tree`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LocationTreeResponse {
    pub nodes: Vec<LocationNode>,
}
