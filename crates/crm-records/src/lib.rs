//! # CRM Records
//!
//! Domain records for the CRM backend and the document store that holds them.
//!
//! ## Overview
//!
//! The crm-records crate handles:
//! - **Identities**: User accounts with role and capability set
//! - **Clients**: Companies and contacts in the sales pipeline
//! - **Calls**: Logged phone calls against a client
//! - **Appointments**: Scheduled meetings with a client
//! - **Documents**: Uploaded file metadata
//! - **Notifications**: In-app messages, addressed or broadcast
//! - **Emails**: Recorded outgoing emails
//!
//! ## Architecture
//!
//! ```text
//! New* input ──validate()──▶ record ──▶ Collection<T>::insert
//! *Patch     ──apply()─────▶ Collection<T>::update (allow-listed fields only)
//!
//! Store
//!   ├─ users          MemoryCollection<Identity>
//!   ├─ clients        MemoryCollection<Client>
//!   ├─ calls          MemoryCollection<Call>
//!   ├─ appointments   MemoryCollection<Appointment>
//!   ├─ documents      MemoryCollection<Document>
//!   ├─ notifications  MemoryCollection<Notification>
//!   └─ emails         MemoryCollection<Email>
//! ```
//!
//! Every record carries exactly one owner reference, fixed at creation and
//! exposed through [`crm_rbac::Owned`]. Patches cannot reach owner, id, or
//! timestamp fields.
//!
//! ## Usage
//!
//! ```rust
//! use crm_records::{Collection, NewClient, Store};
//! use uuid::Uuid;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Store::new();
//! let owner = Uuid::now_v7();
//!
//! let input = NewClient {
//!     company_name: Some("Acme".into()),
//!     contact_name: Some("Jane Roe".into()),
//!     email: Some("jane@acme.test".into()),
//!     phone: Some("+33 1 23 45 67 89".into()),
//!     ..Default::default()
//! };
//! let client = input.into_client(owner).unwrap();
//! store.clients.insert(client).await.unwrap();
//!
//! assert_eq!(store.clients.count(&|_| true).await, 1);
//! # }
//! ```

pub mod appointment;
pub mod call;
pub mod client;
pub mod document;
pub mod email;
pub mod error;
pub mod notification;
pub mod store;
pub mod user;
mod validate;

// Re-export main types for convenience
pub use appointment::{Appointment, AppointmentPatch, AppointmentStatus, NewAppointment};
pub use call::{Call, CallPatch, CallResult, NewCall};
pub use client::{Client, ClientPatch, LeadPriority, NewClient, PipelineStage};
pub use document::{Document, NewDocument};
pub use email::{Email, NewEmail};
pub use error::{RecordError, RecordResult};
pub use notification::{
    Author, NewNotification, Notification, NotificationKind, NotificationView, ReadReceipts, Recipient,
};
pub use store::{Collection, MemoryCollection, Predicate, Record, SameKey, Store};
pub use user::{Identity, IdentityPatch, IdentityProfile, NewIdentity};
