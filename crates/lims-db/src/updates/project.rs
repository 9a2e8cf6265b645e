//! Project update builder.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_lab_contact: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_project_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_warn: Option<Option<DateTime<Utc>>>,
}

pub struct ProjectUpdateBuilder(ProjectUpdate);

impl ProjectUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ProjectUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub fn primary_lab_contact(mut self, user_id: Option<String>) -> Self {
        self.0.primary_lab_contact = Some(user_id);
        self
    }

    #[must_use]
    pub fn crm_project_id(mut self, crm_project_id: Option<String>) -> Self {
        self.0.crm_project_id = Some(crm_project_id);
        self
    }

    #[must_use]
    pub const fn deadline(mut self, deadline: Option<DateTime<Utc>>) -> Self {
        self.0.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub const fn deadline_warn(mut self, deadline_warn: Option<DateTime<Utc>>) -> Self {
        self.0.deadline_warn = Some(deadline_warn);
        self
    }

    #[must_use]
    pub fn build(self) -> ProjectUpdate {
        self.0
    }
}

impl Default for ProjectUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
