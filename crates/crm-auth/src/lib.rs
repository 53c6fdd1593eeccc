//! # CRM Authentication
//!
//! This crate provides authentication for the CRM backend.
//!
//! ## Overview
//!
//! The crm-auth crate handles:
//! - **JWT**: Token issuance and validation (HMAC-signed, issuer and expiry checked)
//! - **Passwords**: Argon2id hashing and verification
//! - **Credential verification**: Bearer token or email/password to a stored identity
//!
//! ## Usage
//!
//! ```rust
//! use crm_auth::JwtService;
//! use uuid::Uuid;
//!
//! let service = JwtService::with_secret("a-secret-that-is-at-least-32-bytes-long").unwrap();
//!
//! let identity_id = Uuid::now_v7();
//! let token = service.issue_token(identity_id).unwrap();
//!
//! let claims = service.validate_token(&token).unwrap();
//! assert_eq!(claims.identity_id(), Some(identity_id));
//! ```
//!
//! ## Errors
//!
//! Every credential failure is an [`AuthError`] with `status_code() == 401`.
//! Configuration and internal failures answer 500.

pub mod claims;
pub mod error;
pub mod jwt;
pub mod password;
pub mod verifier;

// Re-export main types for convenience
pub use claims::Claims;
pub use error::{AuthError, AuthResult};
pub use jwt::{JwtAlgorithm, JwtConfig, JwtService};
pub use password::{Password, PasswordHasher, PasswordTooLongError};
pub use verifier::{CredentialVerifier, IdentityDirectory};
