//! Credential verification
//!
//! Turns a presented bearer token, or an email and password, into a stored
//! [`Identity`]. Verification only reads; stamping the login time is left to
//! the caller.

use async_trait::async_trait;
use crm_records::{Collection, Identity, MemoryCollection};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::jwt::JwtService;
use crate::password::{Password, PasswordHasher};

/// Lookup of stored identities.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Find an identity by ID.
    async fn find_identity(&self, id: Uuid) -> Option<Identity>;

    /// Find an identity by its normalized email.
    async fn find_by_email(&self, email: &str) -> Option<Identity>;
}

#[async_trait]
impl IdentityDirectory for MemoryCollection<Identity> {
    async fn find_identity(&self, id: Uuid) -> Option<Identity> {
        self.get(id).await
    }

    async fn find_by_email(&self, email: &str) -> Option<Identity> {
        let email = email.trim().to_lowercase();
        self.find(&|identity: &Identity| identity.email == email)
            .await
            .into_iter()
            .next()
    }
}

/// Verifies bearer tokens and passwords against an identity directory.
pub struct CredentialVerifier<D> {
    jwt: Arc<JwtService>,
    directory: Arc<D>,
}

impl<D> Clone for CredentialVerifier<D> {
    fn clone(&self) -> Self {
        Self {
            jwt: Arc::clone(&self.jwt),
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<D> std::fmt::Debug for CredentialVerifier<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("jwt", &self.jwt)
            .finish_non_exhaustive()
    }
}

impl<D: IdentityDirectory> CredentialVerifier<D> {
    /// Create a verifier.
    pub fn new(jwt: Arc<JwtService>, directory: Arc<D>) -> Self {
        Self { jwt, directory }
    }

    /// Extract the token from an `Authorization` header value.
    ///
    /// # Examples
    ///
    /// ```
    /// use crm_auth::{AuthError, CredentialVerifier};
    /// use crm_records::{Identity, MemoryCollection};
    ///
    /// type Verifier = CredentialVerifier<MemoryCollection<Identity>>;
    ///
    /// assert_eq!(Verifier::extract_bearer(Some("Bearer abc.def")), Ok("abc.def"));
    /// assert_eq!(Verifier::extract_bearer(Some("Basic abc")), Err(AuthError::MissingToken));
    /// assert_eq!(Verifier::extract_bearer(None), Err(AuthError::MissingToken));
    /// ```
    pub fn extract_bearer(header: Option<&str>) -> AuthResult<&str> {
        let value = header.map(str::trim).ok_or(AuthError::MissingToken)?;
        let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(token)
    }

    /// Verify a token and resolve its subject.
    ///
    /// Fails with the token error, `SubjectNotFound` when the identity has
    /// been removed, or `AccountDisabled` when it is inactive.
    pub async fn verify(&self, token: &str) -> AuthResult<Identity> {
        let claims = self.jwt.validate_token(token)?;
        let id = claims
            .identity_id()
            .ok_or_else(|| AuthError::InvalidToken("Invalid subject".to_string()))?;

        let identity = self
            .directory
            .find_identity(id)
            .await
            .ok_or(AuthError::SubjectNotFound)?;

        if !identity.is_active {
            tracing::info!(identity_id = %id, "token presented for disabled account");
            return Err(AuthError::AccountDisabled);
        }
        Ok(identity)
    }

    /// Check an email and password.
    ///
    /// Unknown email and wrong password fail identically, and both cost one
    /// Argon2 verification. The verification runs on the blocking pool.
    pub async fn check_password(
        &self,
        email: &str,
        password: &str,
        hasher: &PasswordHasher,
    ) -> AuthResult<Identity> {
        let password = Password::new(password).map_err(|_| AuthError::InvalidCredentials)?;
        let identity = self.directory.find_by_email(email).await;

        let stored = identity.as_ref().map(|i| i.password_hash.clone());
        let hasher = hasher.clone();
        let matches =
            tokio::task::spawn_blocking(move || hasher.verify_stored(&password, stored.as_deref()))
                .await
                .map_err(|e| AuthError::Internal(format!("password check task failed: {e}")))??;

        let identity = identity.ok_or(AuthError::InvalidCredentials)?;
        if !matches {
            tracing::info!(identity_id = %identity.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }
        if !identity.is_active {
            return Err(AuthError::AccountDisabled);
        }
        Ok(identity)
    }

    /// The token service.
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::Claims;
    use chrono::Duration;
    use crm_rbac::{CapabilityTable, Role};

    const SECRET: &str = "verifier-test-secret-at-least-32-bytes";

    async fn setup() -> (CredentialVerifier<MemoryCollection<Identity>>, Arc<MemoryCollection<Identity>>, PasswordHasher) {
        let hasher = PasswordHasher::with_params(1024, 1, 1).unwrap();
        let users = Arc::new(MemoryCollection::new());
        let hash = hasher.hash(&Password::new("s3cret-pass").unwrap()).unwrap();
        users
            .insert(Identity::new("Ana", "ana@example.com", hash, Role::Agent, &CapabilityTable::defaults()))
            .await
            .unwrap();

        let jwt = Arc::new(JwtService::with_secret(SECRET).unwrap());
        (CredentialVerifier::new(jwt, Arc::clone(&users)), users, hasher)
    }

    #[tokio::test]
    async fn test_verify_resolves_identity() {
        let (verifier, users, _) = setup().await;
        let ana = users.find_by_email("ana@example.com").await.unwrap();
        let token = verifier.jwt().issue_token(ana.id).unwrap();

        let first = verifier.verify(&token).await.unwrap();
        let second = verifier.verify(&token).await.unwrap();
        assert_eq!(first.id, ana.id);
        assert_eq!(second.id, ana.id);
    }

    #[tokio::test]
    async fn test_removed_subject() {
        let (verifier, _, _) = setup().await;
        let token = verifier.jwt().issue_token(Uuid::now_v7()).unwrap();
        assert_eq!(verifier.verify(&token).await.map(|_| ()), Err(AuthError::SubjectNotFound));
    }

    #[tokio::test]
    async fn test_expired_token_never_resolves() {
        let (verifier, users, _) = setup().await;
        let ana = users.find_by_email("ana@example.com").await.unwrap();
        let claims = Claims::new(ana.id, "crm", Duration::minutes(-5));
        let token = verifier.jwt().encode_claims(&claims).unwrap();

        assert_eq!(verifier.verify(&token).await.map(|_| ()), Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn test_disabled_account() {
        let (verifier, users, _) = setup().await;
        let ana = users.find_by_email("ana@example.com").await.unwrap();
        users
            .update(ana.id, Box::new(|u: &mut Identity| {
                u.is_active = false;
                Ok(())
            }))
            .await
            .unwrap();

        let token = verifier.jwt().issue_token(ana.id).unwrap();
        assert_eq!(verifier.verify(&token).await.map(|_| ()), Err(AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_password_check() {
        let (verifier, _, hasher) = setup().await;

        let ok = verifier.check_password(" ANA@example.com", "s3cret-pass", &hasher).await;
        assert!(ok.is_ok());

        let wrong = verifier.check_password("ana@example.com", "nope", &hasher).await;
        let unknown = verifier.check_password("bob@example.com", "s3cret-pass", &hasher).await;
        assert_eq!(wrong.map(|_| ()), Err(AuthError::InvalidCredentials));
        assert_eq!(unknown.map(|_| ()), Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies() {
        let (verifier, _, hasher) = setup().await;

        let unknown = verifier.check_password("nobody@example.com", "s3cret-pass", &hasher).await;
        assert_eq!(unknown.map(|_| ()), Err(AuthError::InvalidCredentials));
        assert!(hasher.has_placeholder());
    }
}
