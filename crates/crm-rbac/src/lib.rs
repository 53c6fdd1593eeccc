//! # CRM RBAC (Capability-Based Access Control)
//!
//! This crate decides whether an authenticated identity may perform an
//! operation on a CRM resource.
//!
//! ## Overview
//!
//! The crm-rbac crate handles:
//! - **Capabilities**: Typed permission tags such as `manage_own_clients`
//! - **Roles**: `admin` and `agent`, each with a default capability set
//! - **Access Decision Gate**: "requires any of" capability checks
//! - **Ownership Scope**: "own" vs. "all" narrowing for reads, rejection for writes
//!
//! ## Architecture
//!
//! ```text
//! request ──▶ credential verifier ──▶ AccessGate::require_any(caps)
//!                                        │
//!                    ┌───────────────────┴───────────────────┐
//!                    ▼                                       ▼
//!        read/list: AccessGate::scope()          update/delete: AccessGate::authorize_mutation()
//!        (filter, never 403)                     (403 when not the owner)
//! ```
//!
//! Administrative roles bypass ownership for every resource kind; every other
//! role is confined to the resources it owns.
//!
//! ## Usage
//!
//! ```rust
//! use crm_rbac::{AccessGate, Capability, CapabilityTable, Role};
//!
//! let table = CapabilityTable::defaults();
//! let agent = table.resolve(Role::Agent);
//!
//! assert!(agent.has_any(&[Capability::ManageClients, Capability::ManageOwnClients]));
//! assert!(!agent.has(Capability::ManageUsers));
//! ```

pub mod capabilities;
pub mod error;
pub mod gate;
pub mod ownership;
pub mod resources;
pub mod roles;

// Re-export main types for convenience
pub use capabilities::{Capability, CapabilitySet};
pub use error::{AuthorizationError, AuthorizationResult};
pub use gate::{AccessGate, Principal};
pub use ownership::{Mutation, Owned, OwnershipScope};
pub use resources::ResourceKind;
pub use roles::{CapabilityTable, Role};
