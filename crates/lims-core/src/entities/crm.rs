//! Local, non-authoritative mirrors of external CRM records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CrmAccount {
    pub id: String,
    pub crm_id: String,
    pub name: String,
    pub email: Option<String>,
    pub institution: Option<String>,
    pub user_id: Option<String>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CrmProject {
    pub id: String,
    pub crm_id: String,
    pub name: String,
    pub description: Option<String>,
    pub account_id: Option<String>,
    pub status: Option<String>,
    pub project_id: Option<String>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CrmQuote {
    pub id: String,
    pub crm_id: String,
    pub quote_number: String,
    pub subtotal: f64,
    pub total: f64,
    pub crm_project_id: Option<String>,
    pub synced_at: DateTime<Utc>,
}

/// An account record as delivered by a CRM source, before mirroring.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CrmAccountRecord {
    pub crm_id: String,
    pub name: String,
    pub email: Option<String>,
    pub institution: Option<String>,
}
