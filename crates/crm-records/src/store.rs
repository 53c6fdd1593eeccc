//! Document store
//!
//! This module provides the collection abstraction the CRM reads and writes
//! through, and an in-memory implementation of it.
//!
//! Each operation is atomic for a single record. Nothing spans records, and
//! concurrent writers to the same record resolve as last-write-wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_rbac::{Owned, ResourceKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::appointment::Appointment;
use crate::call::Call;
use crate::client::Client;
use crate::document::Document;
use crate::email::Email;
use crate::error::{RecordError, RecordResult};
use crate::notification::{Notification, ReadReceipts};
use crate::user::Identity;

/// A stored document.
pub trait Record: Owned + Clone + Send + Sync + 'static {
    /// Resource kind used in errors and access decisions.
    const KIND: ResourceKind;

    /// Primary key.
    fn id(&self) -> Uuid;

    /// Creation time.
    fn created_at(&self) -> DateTime<Utc>;

    /// Stamp the record as modified.
    fn touch(&mut self, at: DateTime<Utc>);
}

/// Filter over records of one collection.
pub type Predicate<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

/// Change applied to one record inside [`Collection::update`].
pub type Change<'a, T> = Box<dyn FnOnce(&mut T) -> RecordResult<()> + Send + 'a>;

/// Whether two records collide on a unique field.
pub type SameKey<'a, T> = &'a (dyn Fn(&T, &T) -> bool + Send + Sync);

/// A collection of records of one kind.
#[async_trait]
pub trait Collection<T: Record>: Send + Sync {
    /// Insert a new record.
    async fn insert(&self, record: T) -> RecordResult<T>;

    /// Insert a new record unless an existing one conflicts with it.
    ///
    /// The conflict check and the insert happen under one write lock.
    async fn insert_unique(
        &self,
        record: T,
        field: &'static str,
        conflicts: Predicate<'_, T>,
    ) -> RecordResult<T>;

    /// Get a record by ID.
    async fn get(&self, id: Uuid) -> Option<T>;

    /// All records matching `predicate`, oldest first.
    async fn find(&self, predicate: Predicate<'_, T>) -> Vec<T>;

    /// Apply a change to one record.
    ///
    /// The change runs against a copy; the stored record is replaced only if
    /// it returns `Ok`.
    async fn update(&self, id: Uuid, change: Change<'_, T>) -> RecordResult<T>;

    /// Apply a change to one record unless the result collides with another
    /// record on a unique field.
    ///
    /// The change, the collision check and the write happen under one write
    /// lock.
    async fn update_unique(
        &self,
        id: Uuid,
        field: &'static str,
        same_key: SameKey<'_, T>,
        change: Change<'_, T>,
    ) -> RecordResult<T>;

    /// Remove a record, returning it.
    async fn remove(&self, id: Uuid) -> RecordResult<T>;

    /// Number of records matching `predicate`.
    async fn count(&self, predicate: Predicate<'_, T>) -> usize;
}

/// In-memory collection.
///
/// This is suitable for single-process deployments and testing.
pub struct MemoryCollection<T> {
    records: RwLock<HashMap<Uuid, T>>,
}

impl<T> std::fmt::Debug for MemoryCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCollection")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Record> MemoryCollection<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Record> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> Collection<T> for MemoryCollection<T> {
    async fn insert(&self, record: T) -> RecordResult<T> {
        let mut records = self.records.write().await;
        records.insert(record.id(), record.clone());
        tracing::debug!(kind = T::KIND.as_str(), id = %record.id(), "record inserted");
        Ok(record)
    }

    async fn insert_unique(
        &self,
        record: T,
        field: &'static str,
        conflicts: Predicate<'_, T>,
    ) -> RecordResult<T> {
        let mut records = self.records.write().await;
        if records.values().any(|existing| conflicts(existing)) {
            return Err(RecordError::Duplicate { field });
        }
        records.insert(record.id(), record.clone());
        tracing::debug!(kind = T::KIND.as_str(), id = %record.id(), "record inserted");
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Option<T> {
        self.records.read().await.get(&id).cloned()
    }

    async fn find(&self, predicate: Predicate<'_, T>) -> Vec<T> {
        let records = self.records.read().await;
        let mut found: Vec<T> = records.values().filter(|&r| predicate(r)).cloned().collect();
        found.sort_by_key(|r| (r.created_at(), r.id()));
        found
    }

    async fn update(&self, id: Uuid, change: Change<'_, T>) -> RecordResult<T> {
        let mut records = self.records.write().await;
        let stored = records.get_mut(&id).ok_or(RecordError::NotFound(T::KIND))?;

        let mut draft = stored.clone();
        change(&mut draft)?;
        draft.touch(Utc::now());
        *stored = draft.clone();

        tracing::debug!(kind = T::KIND.as_str(), id = %id, "record updated");
        Ok(draft)
    }

    async fn update_unique(
        &self,
        id: Uuid,
        field: &'static str,
        same_key: SameKey<'_, T>,
        change: Change<'_, T>,
    ) -> RecordResult<T> {
        let mut records = self.records.write().await;
        let mut draft = records
            .get(&id)
            .cloned()
            .ok_or(RecordError::NotFound(T::KIND))?;
        change(&mut draft)?;

        if records
            .values()
            .any(|other| other.id() != id && same_key(other, &draft))
        {
            return Err(RecordError::Duplicate { field });
        }

        draft.touch(Utc::now());
        records.insert(id, draft.clone());
        tracing::debug!(kind = T::KIND.as_str(), id = %id, "record updated");
        Ok(draft)
    }

    async fn remove(&self, id: Uuid) -> RecordResult<T> {
        let removed = self
            .records
            .write()
            .await
            .remove(&id)
            .ok_or(RecordError::NotFound(T::KIND))?;
        tracing::debug!(kind = T::KIND.as_str(), id = %id, "record removed");
        Ok(removed)
    }

    async fn count(&self, predicate: Predicate<'_, T>) -> usize {
        self.records.read().await.values().filter(|&r| predicate(r)).count()
    }
}

/// All CRM collections.
///
/// Cloning is cheap; clones share the same collections.
#[derive(Debug, Clone, Default)]
pub struct Store {
    /// User accounts.
    pub users: Arc<MemoryCollection<Identity>>,
    /// Clients.
    pub clients: Arc<MemoryCollection<Client>>,
    /// Calls.
    pub calls: Arc<MemoryCollection<Call>>,
    /// Appointments.
    pub appointments: Arc<MemoryCollection<Appointment>>,
    /// Document metadata.
    pub documents: Arc<MemoryCollection<Document>>,
    /// Notifications.
    pub notifications: Arc<MemoryCollection<Notification>>,
    /// Per-reader notification read state.
    pub read_receipts: Arc<ReadReceipts>,
    /// Recorded emails.
    pub emails: Arc<MemoryCollection<Email>>,
}

impl Store {
    /// Create a store with empty collections.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::NewEmail;

    fn email(owner: Uuid, subject: &str) -> Email {
        NewEmail {
            subject: Some(subject.to_string()),
            body: Some("Bonjour".to_string()),
            recipient: Some("client@example.com".to_string()),
        }
        .into_email(owner)
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let emails = MemoryCollection::<Email>::new();
        let saved = emails.insert(email(Uuid::now_v7(), "Relance")).await.unwrap();

        assert_eq!(emails.get(saved.id).await.map(|e| e.subject), Some("Relance".to_string()));

        emails.remove(saved.id).await.unwrap();
        assert!(emails.get(saved.id).await.is_none());
        assert_eq!(
            emails.remove(saved.id).await.map(|_| ()),
            Err(RecordError::NotFound(ResourceKind::Email))
        );
    }

    #[tokio::test]
    async fn test_find_is_creation_ordered() {
        let emails = MemoryCollection::<Email>::new();
        let owner = Uuid::now_v7();
        for subject in ["one", "two", "three"] {
            emails.insert(email(owner, subject)).await.unwrap();
        }

        let subjects: Vec<String> = emails.find(&|_| true).await.into_iter().map(|e| e.subject).collect();
        assert_eq!(subjects, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_insert_unique_rejects_conflict() {
        let emails = MemoryCollection::<Email>::new();
        let owner = Uuid::now_v7();
        emails.insert(email(owner, "same")).await.unwrap();

        let result = emails
            .insert_unique(email(owner, "same"), "subject", &|e: &Email| e.subject == "same")
            .await;
        assert_eq!(result.map(|_| ()), Err(RecordError::Duplicate { field: "subject" }));
        assert_eq!(emails.count(&|_| true).await, 1);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_record_untouched() {
        let emails = MemoryCollection::<Email>::new();
        let saved = emails.insert(email(Uuid::now_v7(), "Draft")).await.unwrap();

        let result = emails
            .update(
                saved.id,
                Box::new(|e: &mut Email| {
                    e.subject = "Changed".to_string();
                    Err(RecordError::invalid("rejected"))
                }),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(emails.get(saved.id).await.unwrap().subject, "Draft");
    }

    #[tokio::test]
    async fn test_update_touches_timestamp() {
        let emails = MemoryCollection::<Email>::new();
        let saved = emails.insert(email(Uuid::now_v7(), "Draft")).await.unwrap();

        let updated = emails
            .update(
                saved.id,
                Box::new(|e: &mut Email| {
                    e.subject = "Final".to_string();
                    Ok(())
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.subject, "Final");
        assert!(updated.updated_at >= saved.updated_at);
    }

    #[tokio::test]
    async fn test_update_unique_checks_under_the_write() {
        let emails = MemoryCollection::<Email>::new();
        let owner = Uuid::now_v7();
        emails.insert(email(owner, "taken")).await.unwrap();
        let draft = emails.insert(email(owner, "draft")).await.unwrap();
        let same_subject = |a: &Email, b: &Email| a.subject == b.subject;

        let clash = emails
            .update_unique(
                draft.id,
                "subject",
                &same_subject,
                Box::new(|e: &mut Email| {
                    e.subject = "taken".to_string();
                    Ok(())
                }),
            )
            .await;
        assert_eq!(clash.map(|_| ()), Err(RecordError::Duplicate { field: "subject" }));
        assert_eq!(emails.get(draft.id).await.unwrap().subject, "draft");

        let kept = emails
            .update_unique(
                draft.id,
                "subject",
                &same_subject,
                Box::new(|e: &mut Email| {
                    e.body = "Relance".to_string();
                    Ok(())
                }),
            )
            .await
            .unwrap();
        assert_eq!(kept.subject, "draft");
        assert_eq!(kept.body, "Relance");
    }
}
