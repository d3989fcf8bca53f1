//! Unified error types for the domain layer
//!
//! Hard failures only. A stat or category that cannot be found is not an
//! error: lookups return `Option`, list mutations become no-ops and the
//! enrichment engine renders an invalid marker instead.

use thiserror::Error;

use crate::value_objects::FormulaError;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (blank names, duplicate tags, unknown categories)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Business rule violation (e.g. a colour slot is already taken)
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Parse error (for value objects and patches)
    #[error("Parse error: {0}")]
    Parse(String),

    /// A hex colour string could not be parsed
    #[error("Invalid color format: {0}")]
    InvalidColor(String),

    /// Every colour slot on a character is already occupied
    #[error("All {max} color slots are occupied")]
    SlotsFull { max: usize },
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// Raised before any update is produced, so callers can surface the
    /// message and abort the mutation without partial writes.
    ///
    /// # Example
    /// ```ignore
    /// if tag.is_empty() {
    ///     return Err(DomainError::validation("Stat tag cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an invalid colour error
    pub fn invalid_color(input: impl Into<String>) -> Self {
        Self::InvalidColor(input.into())
    }

    /// Create a slot exhaustion error
    pub fn slots_full(max: usize) -> Self {
        Self::SlotsFull { max }
    }
}

impl From<FormulaError> for DomainError {
    fn from(err: FormulaError) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("tag cannot be empty");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: tag cannot be empty");
    }

    #[test]
    fn test_constraint_error() {
        let err = DomainError::constraint("slot red is taken");
        assert_eq!(err.to_string(), "Constraint violation: slot red is taken");
    }

    #[test]
    fn test_invalid_color_error() {
        let err = DomainError::invalid_color("#zzz");
        assert_eq!(err.to_string(), "Invalid color format: #zzz");
    }

    #[test]
    fn test_slots_full_error() {
        let err = DomainError::slots_full(8);
        assert!(matches!(err, DomainError::SlotsFull { max: 8 }));
        assert_eq!(err.to_string(), "All 8 color slots are occupied");
    }

    #[test]
    fn test_from_formula_error() {
        let domain_err: DomainError = FormulaError::Empty.into();
        assert!(matches!(domain_err, DomainError::Parse(_)));
        assert!(domain_err.to_string().contains("Empty formula"));
    }
}
