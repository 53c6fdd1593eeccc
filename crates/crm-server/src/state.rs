//! Shared handler state

use crm_auth::{CredentialVerifier, JwtService, Password, PasswordHasher};
use crm_rbac::{AccessGate, CapabilityTable, Role};
use crm_records::{Collection, Identity, MemoryCollection, RecordError, Store};
use std::sync::Arc;

use crate::config::{AdminBootstrap, DEFAULT_MONTHLY_CALL_TARGET};
use crate::error::{ApiError, ApiResult};

/// Credential verifier over the user collection.
pub type Verifier = CredentialVerifier<MemoryCollection<Identity>>;

/// State shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// All collections.
    pub store: Store,
    /// Access decisions.
    pub gate: AccessGate,
    /// Role defaults, built once at startup.
    pub table: Arc<CapabilityTable>,
    /// Bearer token and password checks.
    pub verifier: Verifier,
    /// Password hashing.
    pub hasher: PasswordHasher,
    /// Monthly call goal.
    pub call_target: u32,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assemble state over a store.
    pub fn new(store: Store, jwt: JwtService, hasher: PasswordHasher) -> Self {
        let verifier = CredentialVerifier::new(Arc::new(jwt), Arc::clone(&store.users));
        Self {
            store,
            gate: AccessGate::new(),
            table: Arc::new(CapabilityTable::defaults()),
            verifier,
            hasher,
            call_target: DEFAULT_MONTHLY_CALL_TARGET,
        }
    }

    /// Replace the monthly call goal.
    pub fn with_call_target(mut self, target: u32) -> Self {
        self.call_target = target;
        self
    }

    /// Token service.
    pub fn jwt(&self) -> &JwtService {
        self.verifier.jwt()
    }

    /// Hash a cleartext password off the async runtime.
    pub async fn hash_password(&self, password: &str) -> ApiResult<String> {
        let password = Password::new(password)
            .map_err(|e| RecordError::invalid(format!("password: {e}")))?;
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
            .map_err(ApiError::from)
    }

    /// Create a user account with the given role, rejecting a taken email.
    pub async fn create_identity(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> ApiResult<Identity> {
        let hash = self.hash_password(password).await?;
        let identity = Identity::new(name, email, hash, role, &self.table);
        let email = identity.email.clone();
        let saved = self
            .store
            .users
            .insert_unique(identity, "email", &|u: &Identity| u.email == email)
            .await?;
        tracing::info!(identity_id = %saved.id, role = saved.role.as_str(), "account created");
        Ok(saved)
    }

    /// Create the configured administrator unless its email is taken.
    ///
    /// Returns whether an account was created.
    pub async fn bootstrap_admin(&self, admin: &AdminBootstrap) -> ApiResult<bool> {
        match self
            .create_identity(&admin.name, &admin.email, &admin.password, Role::Admin)
            .await
        {
            Ok(_) => Ok(true),
            Err(ApiError::Record(RecordError::Duplicate { .. })) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
