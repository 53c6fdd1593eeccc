//! Error types for authentication operations
//!
//! This module defines the errors that can occur while issuing or verifying
//! credentials. Every credential failure maps to HTTP 401; configuration and
//! internal failures map to 500.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token was presented
    #[error("No token, authorization denied.")]
    MissingToken,

    /// Token is invalid (malformed, bad signature, wrong issuer, etc.)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Token is valid but its subject no longer exists
    #[error("User not found.")]
    SubjectNotFound,

    /// Account exists but is disabled
    #[error("Account is disabled.")]
    AccountDisabled,

    /// Email or password did not match
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Credential failures are expected and should not be logged as errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::Internal(_) | AuthError::ConfigError(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidToken(_)
            | AuthError::TokenExpired
            | AuthError::SubjectNotFound
            | AuthError::AccountDisabled
            | AuthError::InvalidCredentials => 401,

            AuthError::ConfigError(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::SubjectNotFound => "SUBJECT_NOT_FOUND",
            AuthError::AccountDisabled => "ACCOUNT_DISABLED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_are_401() {
        for err in [
            AuthError::MissingToken,
            AuthError::InvalidToken("bad".into()),
            AuthError::TokenExpired,
            AuthError::SubjectNotFound,
            AuthError::AccountDisabled,
            AuthError::InvalidCredentials,
        ] {
            assert_eq!(err.status_code(), 401, "{err}");
            assert!(!err.is_server_error());
        }
    }

    #[test]
    fn test_server_errors() {
        let err = AuthError::ConfigError("secret too short".into());
        assert_eq!(err.status_code(), 500);
        assert!(err.is_server_error());
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}
