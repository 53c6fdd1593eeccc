//! Password hashing
//!
//! Passwords are hashed with Argon2id and stored as PHC strings. The cleartext
//! is wrapped in [`Password`], which cannot be printed or serialized.
//!
//! Checking a password for an unknown account still runs one Argon2
//! verification, against a placeholder hash built with the same parameters,
//! so the response time does not reveal whether the account exists.

use argon2::password_hash::errors::Error as PasswordHashError;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::error::{AuthError, AuthResult};

/// Cleartext behind the placeholder hash.
const PLACEHOLDER_PASSWORD: &[u8] = b"placeholder-for-unknown-accounts";

/// Fixed salt for the placeholder hash.
const PLACEHOLDER_SALT: &str = "Y3JtcGxhY2Vob2xkZXJzYWx0";

/// Longest accepted password in bytes.
///
/// Hashing cost grows with input length; this bounds it.
pub const MAX_PASSWORD_LENGTH: usize = 512;

/// A cleartext password supplied by a user.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// Wrap a cleartext password, rejecting oversized input.
    pub fn new(password: &str) -> Result<Password, PasswordTooLongError> {
        if password.len() > MAX_PASSWORD_LENGTH {
            Err(PasswordTooLongError)
        } else {
            Ok(Password(password.to_string()))
        }
    }

    fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// The provided password was too long.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("the password provided was too long")]
pub struct PasswordTooLongError;

/// Creates and verifies stored password hashes.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    placeholder: Arc<OnceLock<String>>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Argon2::default())
    }
}

impl PasswordHasher {
    /// Create a hasher with a specific Argon2 context.
    pub fn new(argon2: Argon2<'static>) -> Self {
        Self {
            argon2,
            placeholder: Arc::new(OnceLock::new()),
        }
    }

    /// Create an Argon2id hasher with explicit cost parameters.
    ///
    /// # Arguments
    ///
    /// * `m_cost_kib` - Memory cost in KiB
    /// * `t_cost` - Number of iterations
    /// * `p_cost` - Degree of parallelism
    pub fn with_params(m_cost_kib: u32, t_cost: u32, p_cost: u32) -> AuthResult<Self> {
        let params = argon2::Params::new(m_cost_kib, t_cost, p_cost, None)
            .map_err(|e| AuthError::ConfigError(format!("argon2 parameters: {}", e)))?;
        Ok(Self::new(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::default(),
            params,
        )))
    }

    /// Hash a password into a PHC string.
    pub fn hash(&self, password: &Password) -> AuthResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        self.argon2
            .hash_password(password.expose(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("failed to hash password: {}", e)))
    }

    /// Check a password against a stored PHC string.
    ///
    /// A mismatch is `Ok(false)`; an unreadable hash is an internal error.
    pub fn verify(&self, password: &Password, hashed: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hashed)
            .map_err(|e| AuthError::Internal(format!("stored password hash: {}", e)))?;
        match self.argon2.verify_password(password.expose(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(e) => Err(AuthError::Internal(format!("failed to verify password: {}", e))),
        }
    }

    /// Check a password against an account's hash, or against the
    /// placeholder hash when there is no account.
    ///
    /// Always costs one Argon2 verification. Returns `Ok(false)` when
    /// `hashed` is `None`.
    pub fn verify_stored(&self, password: &Password, hashed: Option<&str>) -> AuthResult<bool> {
        match hashed {
            Some(hashed) => self.verify(password, hashed),
            None => {
                let placeholder = self.placeholder()?;
                self.verify(password, &placeholder)?;
                Ok(false)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn has_placeholder(&self) -> bool {
        self.placeholder.get().is_some()
    }

    fn placeholder(&self) -> AuthResult<String> {
        if let Some(hash) = self.placeholder.get() {
            return Ok(hash.clone());
        }
        let salt = SaltString::from_b64(PLACEHOLDER_SALT)
            .map_err(|e| AuthError::Internal(format!("placeholder salt: {}", e)))?;
        let hash = self
            .argon2
            .hash_password(PLACEHOLDER_PASSWORD, &salt)
            .map_err(|e| AuthError::Internal(format!("failed to hash placeholder: {}", e)))?
            .to_string();
        Ok(self.placeholder.get_or_init(|| hash).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hasher() -> PasswordHasher {
        PasswordHasher::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = test_hasher();
        let password = Password::new("correct horse").unwrap();
        let hash = hasher.hash(&password).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&password, &hash).unwrap());
        assert!(!hasher
            .verify(&Password::new("battery staple").unwrap(), &hash)
            .unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = test_hasher();
        let password = Password::new("same input").unwrap();
        assert_ne!(hasher.hash(&password).unwrap(), hasher.hash(&password).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        let hasher = test_hasher();
        let result = hasher.verify(&Password::new("x").unwrap(), "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[test]
    fn test_unknown_account_runs_a_verification() {
        let hasher = test_hasher();
        let password = Password::new("correct horse").unwrap();

        assert!(hasher.placeholder.get().is_none());
        assert!(!hasher.verify_stored(&password, None).unwrap());

        let placeholder = hasher.placeholder.get().cloned().unwrap();
        assert!(placeholder.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));

        // Clones share the cached placeholder.
        let clone = hasher.clone();
        assert_eq!(clone.placeholder().unwrap(), placeholder);
    }

    #[test]
    fn test_placeholder_never_matches_its_own_cleartext() {
        let hasher = test_hasher();
        let password = Password::new("placeholder-for-unknown-accounts").unwrap();
        assert!(!hasher.verify_stored(&password, None).unwrap());
    }

    #[test]
    fn test_length_limit() {
        assert!(Password::new(&"a".repeat(MAX_PASSWORD_LENGTH)).is_ok());
        assert_eq!(
            Password::new(&"a".repeat(MAX_PASSWORD_LENGTH + 1)).map(|_| ()),
            Err(PasswordTooLongError)
        );
    }

    #[test]
    fn test_debug_hides_cleartext() {
        let password = Password::new("hunter22").unwrap();
        assert!(!format!("{password:?}").contains("hunter22"));
    }
}
