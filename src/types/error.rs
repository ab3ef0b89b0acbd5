//! Unified Error Type System
//!
//! Centralized error types for the crate.
//!
//! ## Error Taxonomy
//!
//! - **NotFound**: a referenced unit, user, event, or AAR does not exist
//! - **Validation**: malformed input rejected at the boundary (fixtures, CLI, storage writes)
//! - **Storage**: persistence failures from the SQLite adapter
//!
//! Access decisions and insight generation never surface these for bad data:
//! they fail closed (deny / empty) and log instead. Errors here are reserved
//! for the storage boundary and for configuration.

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field or component that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)
        } else {
            write!(f, "Validation failed: {}", self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Create a new validation error
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required field missing or empty
    MissingField,
    /// Invalid format (unparseable date, unknown enum value)
    Format,
    /// Parent assignment would break the unit tree
    Hierarchy,
    /// Uniqueness constraint (e.g. one AAR per event and author)
    Duplicate,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum AarError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not initialized: run 'aarlens init' first")]
    NotInitialized,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ValidationError> for AarError {
    fn from(err: ValidationError) -> Self {
        AarError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, AarError>;

impl AarError {
    /// `id` is a numeric key or a lookup name such as a username
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a validation error with a field
    pub fn invalid(
        kind: ValidationErrorKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation(ValidationError::new(kind, message).with_field(field))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| AarError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| AarError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(ValidationErrorKind::Hierarchy, "unit cannot be its own parent")
            .with_field("parent_id");
        assert_eq!(
            err.to_string(),
            "Validation failed for 'parent_id': unit cannot be its own parent"
        );

        let bare = ValidationError::new(ValidationErrorKind::Format, "bad date");
        assert_eq!(bare.to_string(), "Validation failed: bad date");
    }

    #[test]
    fn test_not_found_display() {
        let err = AarError::not_found("unit", 42);
        assert_eq!(err.to_string(), "unit 42 not found");
        assert!(err.is_not_found());

        let by_name = AarError::not_found("user", "jdoe");
        assert_eq!(by_name.to_string(), "user jdoe not found");
    }

    #[test]
    fn test_with_context_wraps_as_storage() {
        let io: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk gone"));
        let err = io.with_context("Failed to read fixture").unwrap_err();
        assert!(matches!(err, AarError::Storage(_)));
        assert_eq!(err.to_string(), "Storage error: Failed to read fixture: disk gone");
    }
}
