//! Error types for authorization decisions

use thiserror::Error;

use crate::capabilities::Capability;
use crate::ownership::Mutation;
use crate::resources::ResourceKind;

/// An authenticated identity is not allowed to perform the operation.
///
/// Every variant maps to HTTP 403 and is terminal for the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    /// None of the required capabilities are held.
    #[error("Access denied. Insufficient permissions.")]
    MissingCapability {
        /// The "any of" list the operation declared.
        required: Vec<Capability>,
    },

    /// The identity does not own the resource it tried to modify.
    #[error("Not authorized to {mutation} this {resource}.")]
    NotOwner {
        /// Kind of the targeted resource.
        resource: ResourceKind,
        /// Operation that was attempted.
        mutation: Mutation,
    },

    /// The operation is reserved for administrative roles.
    #[error("Access denied. Admins only.")]
    AdminOnly,
}

/// Result type for authorization decisions.
pub type AuthorizationResult<T> = Result<T, AuthorizationError>;

impl AuthorizationError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        403
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthorizationError::MissingCapability { .. } => "INSUFFICIENT_PERMISSIONS",
            AuthorizationError::NotOwner { .. } => "NOT_OWNER",
            AuthorizationError::AdminOnly => "ADMIN_ONLY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_owner_message_names_resource_and_action() {
        let err = AuthorizationError::NotOwner {
            resource: ResourceKind::Client,
            mutation: Mutation::Delete,
        };
        assert_eq!(err.to_string(), "Not authorized to delete this client.");
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "NOT_OWNER");
    }

    #[test]
    fn test_missing_capability_does_not_leak_requirements() {
        let err = AuthorizationError::MissingCapability {
            required: vec![Capability::ManageUsers],
        };
        assert!(!err.to_string().contains("manage_users"));
    }
}
