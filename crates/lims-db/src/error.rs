//! Database error types for lims-db.

use lims_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Lookup by id or natural key found nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Operation not allowed in the entity's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A removal would drive an item's stock below zero.
    #[error("Insufficient stock for item {item}: {available} available, {requested} requested")]
    InsufficientStock {
        item: String,
        available: f64,
        requested: f64,
    },

    /// Uniqueness or overlap conflict with an existing row.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    /// Translate a failed INSERT/UPDATE into `Conflict` when it hit a UNIQUE constraint.
    #[must_use]
    pub fn from_write(err: libsql::Error, what: &str) -> Self {
        let msg = err.to_string();
        if msg.contains("UNIQUE constraint failed") {
            Self::Conflict(format!("{what} already exists"))
        } else if msg.contains("CHECK constraint failed") {
            Self::Validation(format!("{what}: {msg}"))
        } else {
            Self::LibSql(err)
        }
    }
}

impl From<CoreError> for DatabaseError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity_type, id } => Self::NotFound {
                entity: entity_type,
                id,
            },
            CoreError::InvalidTransition {
                entity_type,
                id,
                from,
                to,
            } => Self::InvalidState(format!(
                "Cannot transition {entity_type} {id} from {from} to {to}"
            )),
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::Other(e) => Self::Other(e),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(err.into())
    }
}
