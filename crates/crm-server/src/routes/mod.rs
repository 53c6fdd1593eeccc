//! HTTP routes
//!
//! Each handler takes the verified caller, asks the gate first, then runs one
//! or two store operations.

pub mod appointments;
pub mod auth;
pub mod calls;
pub mod clients;
pub mod documents;
pub mod emails;
pub mod notifications;
pub mod stats;

use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use crm_rbac::OwnershipScope;
use crm_records::{Collection, MemoryCollection, Record, RecordError};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// All API routes.
pub fn api() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::router())
        .nest("/api/clients", clients::router())
        .nest("/api/calls", calls::router())
        .nest("/api/appointments", appointments::router())
        .nest("/api/documents", documents::router())
        .nest("/api/notifications", notifications::router())
        .nest("/api/emails", emails::router())
        .nest("/api/stats", stats::router())
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    timestamp: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Answer for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Confirmation body for deletions.
#[derive(Debug, Serialize)]
pub struct Deleted {
    message: String,
    id: Uuid,
}

impl Deleted {
    pub(crate) fn new<T: Record>(id: Uuid) -> Json<Self> {
        let kind = T::KIND.as_str();
        let mut label = kind.to_string();
        if let Some(first) = label.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Json(Self {
            message: format!("{label} deleted successfully."),
            id,
        })
    }
}

/// Load a record the caller may read; anything else is not found.
pub(crate) async fn load_visible<T: Record>(
    collection: &MemoryCollection<T>,
    id: Uuid,
    scope: OwnershipScope,
) -> ApiResult<T> {
    collection
        .get(id)
        .await
        .filter(|record| scope.permits(record))
        .ok_or_else(|| RecordError::NotFound(T::KIND).into())
}

/// Load a record regardless of scope, for mutation checks.
pub(crate) async fn load<T: Record>(collection: &MemoryCollection<T>, id: Uuid) -> ApiResult<T> {
    collection
        .get(id)
        .await
        .ok_or_else(|| RecordError::NotFound(T::KIND).into())
}

/// Fail with an invalid reference unless `id` names an existing record.
pub(crate) async fn require_reference<T: Record>(
    collection: &MemoryCollection<T>,
    id: Option<Uuid>,
) -> ApiResult<()> {
    match id {
        Some(id) if collection.get(id).await.is_some() => Ok(()),
        Some(_) => Err(RecordError::InvalidReference(T::KIND).into()),
        None => Ok(()),
    }
}

/// All records in scope, newest first.
pub(crate) async fn list_newest_first<T: Record>(
    collection: &MemoryCollection<T>,
    scope: OwnershipScope,
) -> Vec<T> {
    let mut records = collection.find(&|record: &T| scope.permits(record)).await;
    records.reverse();
    records
}
