//! # Capabilities
//!
//! Typed permission tags and the sets that hold them.
//! A capability grants access to one class of action.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A permission tag granting access to one action class.
///
/// Tags serialize as their snake_case names (`"manage_own_clients"`), which is
/// also the form stored on identity records and returned in API responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// See the dashboard and its summary statistics.
    ViewDashboard,
    /// Create, edit, and delete any client.
    ManageClients,
    /// Create clients and edit or delete the ones you created.
    ManageOwnClients,
    /// List and read clients.
    ViewClients,
    /// Create appointments; edit or delete within ownership scope.
    ManageAppointments,
    /// Create appointments and edit or delete the ones you created.
    ManageOwnAppointments,
    /// List and read appointments.
    ViewAppointments,
    /// Log calls; edit or delete within ownership scope.
    ManageCalls,
    /// Edit or delete calls you placed.
    ManageOwnCalls,
    /// List and read calls.
    ViewCalls,
    /// Upload and delete any document.
    ManageDocuments,
    /// Upload documents and delete the ones you uploaded.
    ManageOwnDocuments,
    /// List and read documents.
    ViewDocuments,
    /// Full statistics pages.
    ViewStatistics,
    /// List and administer user accounts.
    ManageUsers,
    /// Read notifications addressed to you.
    ViewNotifications,
    /// Publish and delete notifications.
    ManageNotifications,
    /// Read sent emails.
    ViewEmails,
    /// Record outgoing emails.
    SendEmails,
}

impl Capability {
    /// Get the string tag of the capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewDashboard => "view_dashboard",
            Capability::ManageClients => "manage_clients",
            Capability::ManageOwnClients => "manage_own_clients",
            Capability::ViewClients => "view_clients",
            Capability::ManageAppointments => "manage_appointments",
            Capability::ManageOwnAppointments => "manage_own_appointments",
            Capability::ViewAppointments => "view_appointments",
            Capability::ManageCalls => "manage_calls",
            Capability::ManageOwnCalls => "manage_own_calls",
            Capability::ViewCalls => "view_calls",
            Capability::ManageDocuments => "manage_documents",
            Capability::ManageOwnDocuments => "manage_own_documents",
            Capability::ViewDocuments => "view_documents",
            Capability::ViewStatistics => "view_statistics",
            Capability::ManageUsers => "manage_users",
            Capability::ViewNotifications => "view_notifications",
            Capability::ManageNotifications => "manage_notifications",
            Capability::ViewEmails => "view_emails",
            Capability::SendEmails => "send_emails",
        }
    }

    /// Parse a capability from its string tag (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use crm_rbac::Capability;
    ///
    /// assert_eq!(Capability::parse("manage_own_clients"), Some(Capability::ManageOwnClients));
    /// assert_eq!(Capability::parse("VIEW_CALLS"), Some(Capability::ViewCalls));
    /// assert_eq!(Capability::parse("manage_the_moon"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let tag = s.trim().to_lowercase();
        Self::all().into_iter().find(|cap| cap.as_str() == tag)
    }

    /// Get all capabilities.
    pub fn all() -> Vec<Self> {
        vec![
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
        ]
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unordered set of capabilities.
///
/// Duplicates are meaningless and collapse on insert. Serializes as a sorted
/// list of tags so responses are stable.
///
/// # Example
///
/// ```
/// use crm_rbac::{Capability, CapabilitySet};
///
/// let mut set = CapabilitySet::new();
/// set.add(Capability::ViewClients);
/// set.add(Capability::ViewClients);
///
/// assert_eq!(set.len(), 1);
/// assert!(set.has_any(&[Capability::ManageClients, Capability::ViewClients]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    capabilities: HashSet<Capability>,
}

impl CapabilitySet {
    /// Create a new empty capability set.
    pub fn new() -> Self {
        Self {
            capabilities: HashSet::new(),
        }
    }

    /// Add a capability to the set.
    pub fn add(&mut self, capability: Capability) {
        self.capabilities.insert(capability);
    }

    /// Remove a capability from the set.
    ///
    /// # Returns
    ///
    /// `true` if the capability was present, `false` otherwise
    pub fn remove(&mut self, capability: Capability) -> bool {
        self.capabilities.remove(&capability)
    }

    /// Check if the set contains a capability.
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Check if the set shares at least one capability with `required`.
    ///
    /// An empty `required` list never matches.
    pub fn has_any(&self, required: &[Capability]) -> bool {
        required.iter().any(|cap| self.has(*cap))
    }

    /// Check if the set contains every capability in `required`.
    pub fn has_all(&self, required: &[Capability]) -> bool {
        required.iter().all(|cap| self.has(*cap))
    }

    /// Merge another capability set into this one.
    pub fn merge(&mut self, other: &CapabilitySet) {
        self.capabilities.extend(other.capabilities.iter().copied());
    }

    /// Check if this set contains every capability of `other`.
    pub fn is_superset(&self, other: &CapabilitySet) -> bool {
        self.capabilities.is_superset(&other.capabilities)
    }

    /// Create from string tags, dropping any tag that is not a known capability.
    ///
    /// # Example
    ///
    /// ```
    /// use crm_rbac::CapabilitySet;
    ///
    /// let set = CapabilitySet::from_strings(&["view_clients", "typo_clients"]);
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn from_strings<S: AsRef<str>>(tags: &[S]) -> Self {
        tags.iter()
            .filter_map(|tag| Capability::parse(tag.as_ref()))
            .collect()
    }

    /// Get the tags in sorted order.
    pub fn to_strings(&self) -> Vec<String> {
        self.sorted().into_iter().map(|cap| cap.as_str().to_string()).collect()
    }

    /// Get the capabilities in sorted order.
    pub fn sorted(&self) -> Vec<Capability> {
        let mut caps: Vec<Capability> = self.capabilities.iter().copied().collect();
        caps.sort();
        caps
    }

    /// Iterate over the capabilities in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }

    /// Get the count of capabilities.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self {
            capabilities: iter.into_iter().collect(),
        }
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sorted().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CapabilitySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let caps = Vec::<Capability>::deserialize(deserializer)?;
        Ok(caps.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_round_trips_through_tag() {
        for cap in Capability::all() {
            assert_eq!(Capability::parse(cap.as_str()), Some(cap));
        }
    }

    #[test]
    fn test_capability_parse_rejects_unknown_tags() {
        assert_eq!(Capability::parse("manage_own_client"), None);
        assert_eq!(Capability::parse(""), None);
    }

    #[test]
    fn test_has_any_is_intersection_test() {
        let set: CapabilitySet = [Capability::ManageOwnClients].into_iter().collect();

        assert!(set.has_any(&[Capability::ManageClients, Capability::ManageOwnClients]));
        assert!(!set.has_any(&[Capability::ManageClients]));
        assert!(!set.has_any(&[]));
    }

    #[test]
    fn test_has_all() {
        let set: CapabilitySet = [Capability::ViewCalls, Capability::ManageCalls]
            .into_iter()
            .collect();

        assert!(set.has_all(&[Capability::ViewCalls, Capability::ManageCalls]));
        assert!(!set.has_all(&[Capability::ViewCalls, Capability::ManageOwnCalls]));
    }

    #[test]
    fn test_merge_and_remove() {
        let mut a: CapabilitySet = [Capability::ViewClients].into_iter().collect();
        let b: CapabilitySet = [Capability::ViewCalls, Capability::ViewClients]
            .into_iter()
            .collect();

        a.merge(&b);
        assert_eq!(a.len(), 2);
        assert!(a.is_superset(&b));

        assert!(a.remove(Capability::ViewClients));
        assert!(!a.remove(Capability::ViewClients));
        assert!(!a.has(Capability::ViewClients));
    }

    #[test]
    fn test_serializes_as_sorted_tag_list() {
        let set: CapabilitySet = [Capability::ViewCalls, Capability::ViewDashboard]
            .into_iter()
            .collect();

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["view_dashboard","view_calls"]"#);

        let back: CapabilitySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
