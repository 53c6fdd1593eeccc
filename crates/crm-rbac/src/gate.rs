//! # Access Decision Gate
//!
//! Per-request allow/deny decisions. The gate is stateless: every decision is
//! computed from the already-loaded identity and resource.
//!
//! Two rules apply to every resource kind:
//! - capability requirements are "any of" lists (set intersection, not equality)
//! - administrative roles bypass ownership; everyone else is confined to what
//!   they own

use uuid::Uuid;

use crate::capabilities::{Capability, CapabilitySet};
use crate::error::{AuthorizationError, AuthorizationResult};
use crate::ownership::{Mutation, Owned, OwnershipScope};
use crate::resources::ResourceKind;
use crate::roles::Role;

/// An authenticated identity as seen by the gate.
pub trait Principal {
    /// Identity ID, compared against resource owner references.
    fn principal_id(&self) -> Uuid;

    /// The identity's role.
    fn role(&self) -> Role;

    /// The identity's stored capability set.
    fn capabilities(&self) -> &CapabilitySet;
}

/// Stateless access decision gate.
///
/// # Example
///
/// ```
/// use crm_rbac::{AccessGate, Capability, CapabilitySet, Principal, Role};
/// use uuid::Uuid;
///
/// struct Agent { id: Uuid, caps: CapabilitySet }
///
/// impl Principal for Agent {
///     fn principal_id(&self) -> Uuid { self.id }
///     fn role(&self) -> Role { Role::Agent }
///     fn capabilities(&self) -> &CapabilitySet { &self.caps }
/// }
///
/// let agent = Agent {
///     id: Uuid::now_v7(),
///     caps: [Capability::ViewClients].into_iter().collect(),
/// };
///
/// let gate = AccessGate::new();
/// assert!(gate.require_any(&agent, &[Capability::ViewClients]).is_ok());
/// assert!(gate.require_any(&agent, &[Capability::ManageUsers]).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    /// Create a gate.
    pub fn new() -> Self {
        Self
    }

    /// Allow when the principal holds at least one of `required`.
    ///
    /// An empty requirement list denies.
    pub fn require_any<P: Principal + ?Sized>(
        &self,
        principal: &P,
        required: &[Capability],
    ) -> AuthorizationResult<()> {
        if principal.capabilities().has_any(required) {
            tracing::debug!(
                principal = %principal.principal_id(),
                required = ?required,
                "access allowed: capability check passed"
            );
            return Ok(());
        }

        tracing::info!(
            principal = %principal.principal_id(),
            role = principal.role().as_str(),
            required = ?required,
            "access denied: missing capability"
        );
        Err(AuthorizationError::MissingCapability {
            required: required.to_vec(),
        })
    }

    /// Allow only administrative roles.
    pub fn require_admin<P: Principal + ?Sized>(&self, principal: &P) -> AuthorizationResult<()> {
        if principal.role().is_administrative() {
            return Ok(());
        }

        tracing::info!(
            principal = %principal.principal_id(),
            role = principal.role().as_str(),
            "access denied: administrative role required"
        );
        Err(AuthorizationError::AdminOnly)
    }

    /// The read scope for a principal.
    ///
    /// Reads never fail on ownership; they return the subset in scope.
    pub fn scope<P: Principal + ?Sized>(&self, principal: &P) -> OwnershipScope {
        if principal.role().is_administrative() {
            OwnershipScope::All
        } else {
            OwnershipScope::Owner(principal.principal_id())
        }
    }

    /// Decide whether a principal may update or delete a resource.
    pub fn authorize_mutation<P, R>(
        &self,
        principal: &P,
        kind: ResourceKind,
        resource: &R,
        mutation: Mutation,
    ) -> AuthorizationResult<()>
    where
        P: Principal + ?Sized,
        R: Owned + ?Sized,
    {
        if principal.role().is_administrative() || resource.owner_id() == principal.principal_id() {
            return Ok(());
        }

        tracing::info!(
            principal = %principal.principal_id(),
            resource = kind.as_str(),
            owner = %resource.owner_id(),
            mutation = mutation.as_str(),
            "access denied: not the resource owner"
        );
        Err(AuthorizationError::NotOwner {
            resource: kind,
            mutation,
        })
    }

    /// Capability check followed by the ownership check, for one mutation.
    pub fn authorize<P, R>(
        &self,
        principal: &P,
        required: &[Capability],
        kind: ResourceKind,
        resource: &R,
        mutation: Mutation,
    ) -> AuthorizationResult<()>
    where
        P: Principal + ?Sized,
        R: Owned + ?Sized,
    {
        self.require_any(principal, required)?;
        self.authorize_mutation(principal, kind, resource, mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::CapabilityTable;

    struct TestIdentity {
        id: Uuid,
        role: Role,
        caps: CapabilitySet,
    }

    impl TestIdentity {
        fn with_role(role: Role) -> Self {
            Self {
                id: Uuid::now_v7(),
                role,
                caps: CapabilityTable::defaults().resolve(role).clone(),
            }
        }
    }

    impl Principal for TestIdentity {
        fn principal_id(&self) -> Uuid {
            self.id
        }

        fn role(&self) -> Role {
            self.role
        }

        fn capabilities(&self) -> &CapabilitySet {
            &self.caps
        }
    }

    struct TestClient {
        created_by: Uuid,
    }

    impl Owned for TestClient {
        fn owner_id(&self) -> Uuid {
            self.created_by
        }
    }

    const CLIENT_WRITE: &[Capability] = &[Capability::ManageClients, Capability::ManageOwnClients];

    #[test]
    fn test_grant_iff_intersection_non_empty() {
        let table = CapabilityTable::defaults();
        let gate = AccessGate::new();

        for role in Role::all() {
            let identity = TestIdentity::with_role(role);
            for cap in Capability::all() {
                let required = [cap, Capability::ManageUsers];
                let expected = table.resolve(role).has_any(&required);
                assert_eq!(gate.require_any(&identity, &required).is_ok(), expected);
            }
        }
    }

    #[test]
    fn test_empty_requirement_denies() {
        let admin = TestIdentity::with_role(Role::Admin);
        assert!(AccessGate::new().require_any(&admin, &[]).is_err());
    }

    #[test]
    fn test_agent_cannot_delete_someone_elses_client() {
        let agent = TestIdentity::with_role(Role::Agent);
        let client = TestClient {
            created_by: Uuid::now_v7(),
        };

        let result = AccessGate::new().authorize(
            &agent,
            CLIENT_WRITE,
            ResourceKind::Client,
            &client,
            Mutation::Delete,
        );
        assert_eq!(
            result,
            Err(AuthorizationError::NotOwner {
                resource: ResourceKind::Client,
                mutation: Mutation::Delete,
            })
        );
    }

    #[test]
    fn test_agent_can_delete_own_client() {
        let agent = TestIdentity::with_role(Role::Agent);
        let client = TestClient { created_by: agent.id };

        let result = AccessGate::new().authorize(
            &agent,
            CLIENT_WRITE,
            ResourceKind::Client,
            &client,
            Mutation::Delete,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        let admin = TestIdentity::with_role(Role::Admin);
        let client = TestClient {
            created_by: Uuid::now_v7(),
        };

        let gate = AccessGate::new();
        assert!(gate
            .authorize_mutation(&admin, ResourceKind::Client, &client, Mutation::Update)
            .is_ok());
        assert_eq!(gate.scope(&admin), OwnershipScope::All);
    }

    #[test]
    fn test_capability_is_checked_before_ownership() {
        let mut agent = TestIdentity::with_role(Role::Agent);
        agent.caps = CapabilitySet::new();
        let client = TestClient { created_by: agent.id };

        let result = AccessGate::new().authorize(
            &agent,
            CLIENT_WRITE,
            ResourceKind::Client,
            &client,
            Mutation::Update,
        );
        assert!(matches!(result, Err(AuthorizationError::MissingCapability { .. })));
    }

    #[test]
    fn test_agent_scope_is_own() {
        let agent = TestIdentity::with_role(Role::Agent);
        assert_eq!(AccessGate::new().scope(&agent), OwnershipScope::Owner(agent.id));
    }

    #[test]
    fn test_require_admin() {
        let gate = AccessGate::new();
        assert!(gate.require_admin(&TestIdentity::with_role(Role::Admin)).is_ok());
        assert_eq!(
            gate.require_admin(&TestIdentity::with_role(Role::Agent)),
            Err(AuthorizationError::AdminOnly)
        );
    }
}
