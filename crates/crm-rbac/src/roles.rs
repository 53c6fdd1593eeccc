//! Roles and their default capability sets
//!
//! The role table is static configuration: it is built once at startup and
//! shared read-only for the life of the process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::capabilities::{Capability, CapabilitySet};

/// Role of a CRM user.
///
/// # Examples
///
/// ```
/// use crm_rbac::Role;
///
/// assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
/// assert!(Role::Admin.is_administrative());
/// assert!(!Role::Agent.is_administrative());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Back-office administrator; sees and edits everything.
    Admin,
    /// Sales agent; works on the records they own.
    Agent,
}

impl Role {
    /// Check if this role bypasses resource ownership checks.
    pub fn is_administrative(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Parse role from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "agent" => Some(Self::Agent),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Agent => "agent",
        }
    }

    /// Get all roles.
    pub fn all() -> [Role; 2] {
        [Role::Admin, Role::Agent]
    }

    /// The built-in capability list for this role.
    fn default_capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Admin => &[
                Capability::ViewDashboard,
                Capability::ManageClients,
                Capability::ManageOwnClients,
                Capability::ViewClients,
                Capability::ManageAppointments,
                Capability::ManageOwnAppointments,
                Capability::ViewAppointments,
                Capability::ManageCalls,
                Capability::ManageOwnCalls,
                Capability::ViewCalls,
                Capability::ManageDocuments,
                Capability::ManageOwnDocuments,
                Capability::ViewDocuments,
                Capability::ViewStatistics,
                Capability::ManageUsers,
                Capability::ViewNotifications,
                Capability::ManageNotifications,
                Capability::ViewEmails,
                Capability::SendEmails,
            ],
            Role::Agent => &[
                Capability::ViewDashboard,
                Capability::ViewClients,
                Capability::ManageOwnClients,
                Capability::ManageAppointments,
                Capability::ViewAppointments,
                Capability::ManageCalls,
                Capability::ViewCalls,
                Capability::ViewDocuments,
                Capability::ManageOwnDocuments,
                Capability::ViewNotifications,
                Capability::ViewEmails,
                Capability::SendEmails,
            ],
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Agent
    }
}

/// Immutable role → capability mapping.
///
/// Construct it once with [`CapabilityTable::defaults`] and share it; there is
/// no way to mutate a table after construction.
///
/// # Examples
///
/// ```
/// use crm_rbac::{CapabilityTable, Role};
///
/// let table = CapabilityTable::defaults();
/// assert!(table.resolve(Role::Admin).is_superset(table.resolve(Role::Agent)));
/// assert!(table.resolve_name("auditor").is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct CapabilityTable {
    roles: HashMap<Role, CapabilitySet>,
    empty: CapabilitySet,
}

impl CapabilityTable {
    /// Build the table from each role's built-in capability list.
    pub fn defaults() -> Self {
        let roles = Role::all()
            .into_iter()
            .map(|role| (role, role.default_capabilities().iter().copied().collect()))
            .collect();

        Self {
            roles,
            empty: CapabilitySet::new(),
        }
    }

    /// Resolve the capability set for a role.
    pub fn resolve(&self, role: Role) -> &CapabilitySet {
        self.roles.get(&role).unwrap_or(&self.empty)
    }

    /// Resolve the capability set for a role name.
    ///
    /// Unknown role names resolve to the empty set, which denies everything.
    pub fn resolve_name(&self, role: &str) -> &CapabilitySet {
        match Role::parse(role) {
            Some(role) => self.resolve(role),
            None => &self.empty,
        }
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" Agent "), Some(Role::Agent));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_admin_is_strict_superset_of_agent() {
        let table = CapabilityTable::defaults();
        let admin = table.resolve(Role::Admin);
        let agent = table.resolve(Role::Agent);

        assert!(admin.is_superset(agent));
        assert!(admin.len() > agent.len());
    }

    #[test]
    fn test_administrative_only_capabilities() {
        let table = CapabilityTable::defaults();
        let agent = table.resolve(Role::Agent);

        assert!(!agent.has(Capability::ManageUsers));
        assert!(!agent.has(Capability::ManageDocuments));
        assert!(!agent.has(Capability::ManageClients));
        assert!(agent.has(Capability::ManageOwnDocuments));
        assert!(agent.has(Capability::ManageOwnClients));
    }

    #[test]
    fn test_resolution_is_reproducible() {
        let first = CapabilityTable::defaults();
        let second = CapabilityTable::defaults();

        for role in Role::all() {
            assert_eq!(first.resolve(role).to_strings(), second.resolve(role).to_strings());
            assert_eq!(first.resolve_name(role.as_str()), first.resolve(role));
        }
    }

    #[test]
    fn test_unknown_role_name_resolves_to_empty_set() {
        let table = CapabilityTable::defaults();
        assert!(table.resolve_name("superuser").is_empty());
        assert!(table.resolve_name("").is_empty());
    }
}
