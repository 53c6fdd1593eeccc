//! User identity records
//!
//! An identity is an account that can authenticate. Its capability set is
//! seeded from its role when the account is created and is not recomputed
//! when the role later changes; [`Identity::rederive_capabilities`] does that
//! explicitly.

use chrono::{DateTime, Utc};
use crm_rbac::{CapabilitySet, CapabilityTable, Owned, Principal, ResourceKind, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordResult;
use crate::store::Record;
use crate::validate::{self, Validator};

/// A stored user account.
///
/// The password hash is never serialized and is redacted from `Debug`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique identity ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Login email (normalized to lowercase, unique)
    pub email: String,

    /// PHC-format password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Role
    pub role: Role,

    /// Capabilities held by this identity
    pub capabilities: CapabilitySet,

    /// Whether the account may authenticate
    pub is_active: bool,

    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("capabilities", &self.capabilities)
            .field("is_active", &self.is_active)
            .field("last_login", &self.last_login)
            .finish()
    }
}

impl Identity {
    /// Creates a new active identity.
    ///
    /// The capability set is copied from `table` for `role`.
    ///
    /// # Examples
    ///
    /// ```
    /// use crm_rbac::{Capability, CapabilityTable, Role};
    /// use crm_records::Identity;
    ///
    /// let table = CapabilityTable::defaults();
    /// let agent = Identity::new("Ana", "Ana@Example.com", "$argon2id$...", Role::Agent, &table);
    ///
    /// assert_eq!(agent.email, "ana@example.com");
    /// assert!(agent.capabilities.has(Capability::ManageOwnClients));
    /// assert!(agent.is_active);
    /// ```
    pub fn new(
        name: impl Into<String>,
        email: &str,
        password_hash: impl Into<String>,
        role: Role,
        table: &CapabilityTable,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into().trim().to_string(),
            email: validate::normalize_email(email),
            password_hash: password_hash.into(),
            role,
            capabilities: table.resolve(role).clone(),
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a successful login.
    pub fn touch_login(&mut self) {
        let now = Utc::now();
        self.last_login = Some(now);
        self.updated_at = now;
    }

    /// Replace the capability set with the role's current defaults.
    pub fn rederive_capabilities(&mut self, table: &CapabilityTable) {
        self.capabilities = table.resolve(self.role).clone();
        self.updated_at = Utc::now();
    }

    /// Public view of this identity.
    pub fn profile(&self) -> IdentityProfile {
        IdentityProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            capabilities: self.capabilities.clone(),
            is_active: self.is_active,
            last_login: self.last_login,
            created_at: self.created_at,
        }
    }
}

impl Principal for Identity {
    fn principal_id(&self) -> Uuid {
        self.id
    }

    fn role(&self) -> Role {
        self.role
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }
}

impl Owned for Identity {
    fn owner_id(&self) -> Uuid {
        self.id
    }
}

impl Record for Identity {
    const KIND: ResourceKind = ResourceKind::User;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Public JSON shape of an identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProfile {
    /// Identity ID
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Role
    pub role: Role,
    /// Capabilities
    pub capabilities: CapabilitySet,
    /// Whether the account may authenticate
    pub is_active: bool,
    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Registration input.
///
/// There is no role field: self-registered accounts are always agents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIdentity {
    /// Display name
    pub name: Option<String>,
    /// Login email
    pub email: Option<String>,
    /// Cleartext password
    pub password: Option<String>,
}

impl NewIdentity {
    /// Minimum accepted password length.
    pub const MIN_PASSWORD_LEN: usize = 8;

    /// Check required fields and formats.
    pub fn validate(&self) -> RecordResult<()> {
        let password_ok = self
            .password
            .as_deref()
            .map_or(true, |p| p.is_empty() || p.chars().count() >= Self::MIN_PASSWORD_LEN);

        Validator::new()
            .text("name", &self.name)
            .text("email", &self.email)
            .email("email", &self.email)
            .present("password", &self.password.as_ref().filter(|p| !p.is_empty()))
            .check(
                password_ok,
                format!("password must be at least {} characters", Self::MIN_PASSWORD_LEN),
            )
            .finish()
    }
}

/// Administrative edit of an identity.
///
/// Only these fields can change; email, password, and capabilities are not
/// editable through a patch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPatch {
    /// New display name
    pub name: Option<String>,
    /// New role (capabilities are not recomputed)
    pub role: Option<Role>,
    /// Enable or disable the account
    pub is_active: Option<bool>,
}

impl IdentityPatch {
    /// Apply the allow-listed fields.
    pub fn apply(self, identity: &mut Identity) -> RecordResult<()> {
        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(crate::RecordError::invalid("name must not be blank"));
            }
            identity.name = name;
        }
        if let Some(role) = self.role {
            identity.role = role;
        }
        if let Some(active) = self.is_active {
            identity.is_active = active;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_rbac::Capability;

    fn agent() -> Identity {
        Identity::new("Ana", "ana@example.com", "hash", Role::Agent, &CapabilityTable::defaults())
    }

    #[test]
    fn test_hash_is_never_serialized() {
        let json = serde_json::to_value(agent()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("capabilities").unwrap().is_array());
    }

    #[test]
    fn test_debug_redacts_hash() {
        let mut identity = agent();
        identity.password_hash = "$argon2id$secret".into();
        assert!(!format!("{identity:?}").contains("secret"));
    }

    #[test]
    fn test_role_change_does_not_recompute_capabilities() {
        let mut identity = agent();
        IdentityPatch {
            role: Some(Role::Admin),
            ..Default::default()
        }
        .apply(&mut identity)
        .unwrap();

        assert_eq!(identity.role, Role::Admin);
        assert!(!identity.capabilities.has(Capability::ManageUsers));

        identity.rederive_capabilities(&CapabilityTable::defaults());
        assert!(identity.capabilities.has(Capability::ManageUsers));
    }

    #[test]
    fn test_registration_validation() {
        let err = NewIdentity::default().validate().unwrap_err();
        assert_eq!(err.details().len(), 3);

        let short = NewIdentity {
            name: Some("Ana".into()),
            email: Some("ana@example.com".into()),
            password: Some("short".into()),
        };
        assert!(short.validate().is_err());

        let ok = NewIdentity {
            password: Some("long enough".into()),
            ..short
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_blank_name_patch_is_rejected() {
        let mut identity = agent();
        let result = IdentityPatch {
            name: Some("  ".into()),
            ..Default::default()
        }
        .apply(&mut identity);
        assert!(result.is_err());
        assert_eq!(identity.name, "Ana");
    }

    #[test]
    fn test_login_stamp() {
        let mut identity = agent();
        assert!(identity.last_login.is_none());
        identity.touch_login();
        assert!(identity.last_login.is_some());
    }
}
