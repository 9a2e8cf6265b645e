//! Cross-cutting error types for the LIMS.
//!
//! Storage errors live in `lims-db` (`DatabaseError`), configuration errors in
//! `lims-config` (`ConfigError`). The binary converges everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any LIMS crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (format, ranges, required fields).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Reject blank names and identifiers.
///
/// # Errors
///
/// Returns `CoreError::Validation` when `value` is empty after trimming.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

/// Reject negative (or non-finite) amounts.
///
/// # Errors
///
/// Returns `CoreError::Validation` when `value` is negative, NaN, or infinite.
pub fn require_non_negative(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{field} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Reject zero, negative, or non-finite amounts.
///
/// # Errors
///
/// Returns `CoreError::Validation` when `value` is not strictly positive.
pub fn require_positive(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CoreError::Validation(format!(
            "{field} must be greater than zero, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_is_rejected() {
        assert!(require_non_blank("name", "  ").is_err());
        assert!(require_non_blank("name", "Plate A").is_ok());
    }

    #[test]
    fn amount_checks() {
        assert!(require_non_negative("amount", 0.0).is_ok());
        assert!(require_non_negative("amount", -0.5).is_err());
        assert!(require_non_negative("amount", f64::NAN).is_err());
        assert!(require_positive("amount", 0.0).is_err());
        assert!(require_positive("amount", 1.5).is_ok());
    }

    #[test]
    fn validation_message() {
        let err = require_positive("amount_to_take", -1.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: amount_to_take must be greater than zero, got -1"
        );
    }
}
