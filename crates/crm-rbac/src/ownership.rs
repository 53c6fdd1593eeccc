//! Resource ownership
//!
//! Every resource records exactly one owning identity. Reads are narrowed to
//! an [`OwnershipScope`]; mutations compare the owner directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A resource that records the identity owning it.
pub trait Owned {
    /// The identity that created (or is assigned to) this resource.
    fn owner_id(&self) -> Uuid;

    /// Whether a non-administrative identity may see this resource.
    ///
    /// Defaults to ownership. Resources addressed to other identities
    /// (such as notifications) widen this.
    fn visible_to(&self, identity: Uuid) -> bool {
        self.owner_id() == identity
    }
}

/// Which resources a read may return.
///
/// # Examples
///
/// ```
/// use crm_rbac::OwnershipScope;
/// use uuid::Uuid;
///
/// let me = Uuid::now_v7();
/// let someone_else = Uuid::now_v7();
///
/// assert!(OwnershipScope::All.admits(someone_else));
/// assert!(OwnershipScope::Owner(me).admits(me));
/// assert!(!OwnershipScope::Owner(me).admits(someone_else));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "owner", rename_all = "snake_case")]
pub enum OwnershipScope {
    /// Every resource.
    All,
    /// Only resources visible to this identity.
    Owner(Uuid),
}

impl OwnershipScope {
    /// Check an owner reference against the scope.
    pub fn admits(&self, owner: Uuid) -> bool {
        match self {
            OwnershipScope::All => true,
            OwnershipScope::Owner(id) => *id == owner,
        }
    }

    /// Check a resource against the scope.
    pub fn permits<R: Owned + ?Sized>(&self, resource: &R) -> bool {
        match self {
            OwnershipScope::All => true,
            OwnershipScope::Owner(id) => resource.visible_to(*id),
        }
    }

    /// Keep only the resources this scope permits.
    pub fn filter<R: Owned>(&self, resources: Vec<R>) -> Vec<R> {
        match self {
            OwnershipScope::All => resources,
            OwnershipScope::Owner(_) => resources.into_iter().filter(|r| self.permits(r)).collect(),
        }
    }

    /// Check if the scope is unrestricted.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, OwnershipScope::All)
    }
}

/// A write-class operation on an existing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    /// Modify fields of the resource.
    Update,
    /// Remove the resource.
    Delete,
}

impl Mutation {
    /// Get the verb used in messages ("update", "delete").
    pub fn as_str(&self) -> &'static str {
        match self {
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        owner: Uuid,
    }

    impl Owned for Note {
        fn owner_id(&self) -> Uuid {
            self.owner
        }
    }

    struct Broadcast {
        owner: Uuid,
        recipients: Vec<Uuid>,
    }

    impl Owned for Broadcast {
        fn owner_id(&self) -> Uuid {
            self.owner
        }

        fn visible_to(&self, identity: Uuid) -> bool {
            self.owner == identity || self.recipients.contains(&identity)
        }
    }

    #[test]
    fn test_filter_keeps_owned_subset() {
        let me = Uuid::now_v7();
        let other = Uuid::now_v7();
        let notes = vec![Note { owner: me }, Note { owner: other }, Note { owner: me }];

        let mine = OwnershipScope::Owner(me).filter(notes);
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|n| n.owner == me));
    }

    #[test]
    fn test_all_scope_keeps_everything() {
        let notes = vec![Note { owner: Uuid::now_v7() }, Note { owner: Uuid::now_v7() }];
        assert_eq!(OwnershipScope::All.filter(notes).len(), 2);
    }

    #[test]
    fn test_visibility_can_be_wider_than_ownership() {
        let me = Uuid::now_v7();
        let sender = Uuid::now_v7();
        let msg = Broadcast {
            owner: sender,
            recipients: vec![me],
        };

        assert!(!OwnershipScope::Owner(me).admits(msg.owner_id()));
        assert!(OwnershipScope::Owner(me).permits(&msg));
    }
}
