//! In-app notifications
//!
//! A notification with no recipients is a broadcast and is visible to every
//! identity. Otherwise it is visible to its author and to the listed
//! recipients. Only the author may delete it.
//!
//! Read state belongs to each reader, not to the notification. It lives in
//! [`ReadReceipts`], so marking a broadcast as read affects nobody else and
//! leaves the shared record untouched.

use chrono::{DateTime, Utc};
use crm_rbac::{Owned, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::RecordResult;
use crate::store::Record;
use crate::user::Identity;
use crate::validate::{self, Validator};

/// Severity shown with a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Informational.
    Info,
    /// Needs attention.
    Warning,
    /// Something failed.
    Error,
    /// Something succeeded.
    Success,
}

/// An identity a notification is addressed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    /// Identity ID
    pub id: Uuid,
    /// Display name at send time
    pub name: String,
    /// Email at send time
    pub email: String,
}

/// The identity that created a notification.
pub type Author = Recipient;

impl From<&Identity> for Recipient {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
        }
    }
}

/// A stored notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Message text
    pub message: String,
    /// Severity
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Addressees; empty means everyone
    pub recipients: Vec<Recipient>,
    /// Author (owner)
    pub created_by: Author,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Whether this notification is addressed to everyone.
    pub fn is_broadcast(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Pair the notification with one reader's read state.
    pub fn seen_as(self, is_read: bool) -> NotificationView {
        NotificationView {
            notification: self,
            is_read,
        }
    }
}

/// A notification as one reader sees it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    /// The shared record
    #[serde(flatten)]
    pub notification: Notification,
    /// Whether this reader has read it
    pub is_read: bool,
}

/// Per-reader read state for notifications.
#[derive(Debug, Default)]
pub struct ReadReceipts {
    read: RwLock<HashMap<Uuid, HashSet<Uuid>>>,
}

impl ReadReceipts {
    /// Create an empty receipt table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether `reader` has read `notification`.
    pub async fn mark(&self, notification: Uuid, reader: Uuid, is_read: bool) {
        let mut read = self.read.write().await;
        if is_read {
            read.entry(notification).or_default().insert(reader);
        } else if let Some(readers) = read.get_mut(&notification) {
            readers.remove(&reader);
            if readers.is_empty() {
                read.remove(&notification);
            }
        }
    }

    /// Whether `reader` has read `notification`.
    pub async fn is_read(&self, notification: Uuid, reader: Uuid) -> bool {
        self.read
            .read()
            .await
            .get(&notification)
            .is_some_and(|readers| readers.contains(&reader))
    }

    /// Attach `reader`'s read state to each notification.
    pub async fn views(&self, notifications: Vec<Notification>, reader: Uuid) -> Vec<NotificationView> {
        let read = self.read.read().await;
        notifications
            .into_iter()
            .map(|n| {
                let is_read = read.get(&n.id).is_some_and(|readers| readers.contains(&reader));
                n.seen_as(is_read)
            })
            .collect()
    }

    /// Drop every receipt for a deleted notification.
    pub async fn forget(&self, notification: Uuid) {
        self.read.write().await.remove(&notification);
    }
}

impl Owned for Notification {
    fn owner_id(&self) -> Uuid {
        self.created_by.id
    }

    fn visible_to(&self, identity: Uuid) -> bool {
        self.is_broadcast()
            || self.created_by.id == identity
            || self.recipients.iter().any(|r| r.id == identity)
    }
}

impl Record for Notification {
    const KIND: ResourceKind = ResourceKind::Notification;

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

/// Input for sending a notification.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    /// Title
    pub title: Option<String>,
    /// Message text
    pub message: Option<String>,
    /// Severity
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
    /// Addressee identity IDs; empty or absent means everyone
    #[serde(default)]
    pub recipients: Vec<Uuid>,
}

impl NewNotification {
    /// Check required fields.
    pub fn validate(&self) -> RecordResult<()> {
        Validator::new()
            .text("title", &self.title)
            .text("message", &self.message)
            .present("type", &self.kind)
            .finish()
    }

    /// Validate and build the record.
    ///
    /// `recipients` are the resolved addressees of `self.recipients`.
    pub fn into_notification(
        self,
        author: Author,
        recipients: Vec<Recipient>,
    ) -> RecordResult<Notification> {
        self.validate()?;
        let now = Utc::now();
        Ok(Notification {
            id: Uuid::now_v7(),
            title: validate::required(self.title),
            message: validate::required(self.message),
            kind: self.kind.unwrap_or(NotificationKind::Info),
            recipients,
            created_by: author,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str) -> Recipient {
        Recipient {
            id: Uuid::now_v7(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn input() -> NewNotification {
        NewNotification {
            title: Some("Réunion".into()),
            message: Some("Lundi 9h".into()),
            kind: Some(NotificationKind::Info),
            recipients: Vec::new(),
        }
    }

    #[test]
    fn test_broadcast_is_visible_to_everyone() {
        let note = input().into_notification(person("Admin"), Vec::new()).unwrap();
        assert!(note.is_broadcast());
        assert!(note.visible_to(Uuid::now_v7()));
    }

    #[test]
    fn test_addressed_visibility() {
        let author = person("Admin");
        let bob = person("Bob");
        let note = input()
            .into_notification(author.clone(), vec![bob.clone()])
            .unwrap();

        assert!(note.visible_to(author.id));
        assert!(note.visible_to(bob.id));
        assert!(!note.visible_to(Uuid::now_v7()));
        assert_eq!(note.owner_id(), author.id);
    }

    #[test]
    fn test_type_field_name() {
        let parsed: NewNotification = serde_json::from_value(serde_json::json!({
            "title": "t",
            "message": "m",
            "type": "warning",
        }))
        .unwrap();
        assert_eq!(parsed.kind, Some(NotificationKind::Warning));

        let note = parsed.into_notification(person("Admin"), Vec::new()).unwrap();
        let json = serde_json::to_value(note.seen_as(false)).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["isRead"], false);
        assert_eq!(json["title"], "t");
    }

    #[tokio::test]
    async fn test_receipts_are_per_reader() {
        let note = input().into_notification(person("Admin"), Vec::new()).unwrap();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let receipts = ReadReceipts::new();

        receipts.mark(note.id, bob, true).await;
        assert!(receipts.is_read(note.id, bob).await);
        assert!(!receipts.is_read(note.id, alice).await);

        let views = receipts.views(vec![note.clone()], alice).await;
        assert!(!views[0].is_read);
        assert_eq!(views[0].notification, note);

        receipts.mark(note.id, bob, false).await;
        assert!(!receipts.is_read(note.id, bob).await);
    }

    #[tokio::test]
    async fn test_forget_clears_receipts() {
        let note = input().into_notification(person("Admin"), Vec::new()).unwrap();
        let reader = Uuid::now_v7();
        let receipts = ReadReceipts::new();

        receipts.mark(note.id, reader, true).await;
        receipts.forget(note.id).await;
        assert!(!receipts.is_read(note.id, reader).await);
    }

    #[test]
    fn test_requires_type() {
        let err = NewNotification {
            kind: None,
            ..input()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.details(), ["type is required"]);
    }
}
