//! Error types for record validation and storage

use crm_rbac::ResourceKind;
use thiserror::Error;

/// Record validation and storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Input failed validation; one message per problem.
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A unique field already holds this value.
    #[error("A record with this {field} already exists.")]
    Duplicate {
        /// Name of the unique field.
        field: &'static str,
    },

    /// No record with the requested ID is visible.
    #[error("{0} not found.")]
    NotFound(ResourceKind),

    /// A reference field points at a record that does not exist.
    #[error("Referenced {0} does not exist.")]
    InvalidReference(ResourceKind),
}

/// Result type for record operations.
pub type RecordResult<T> = Result<T, RecordError>;

impl RecordError {
    /// Shorthand for a single validation message.
    pub fn invalid(message: impl Into<String>) -> Self {
        RecordError::Validation(vec![message.into()])
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            RecordError::Validation(_)
            | RecordError::Duplicate { .. }
            | RecordError::InvalidReference(_) => 400,
            RecordError::NotFound(_) => 404,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RecordError::Validation(_) => "VALIDATION_ERROR",
            RecordError::Duplicate { .. } => "DUPLICATE",
            RecordError::NotFound(_) => "NOT_FOUND",
            RecordError::InvalidReference(_) => "INVALID_REFERENCE",
        }
    }

    /// Individual validation messages, if any.
    pub fn details(&self) -> &[String] {
        match self {
            RecordError::Validation(errors) => errors,
            _ => &[],
        }
    }
}
