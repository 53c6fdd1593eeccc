//! Notification routes
//!
//! A notification is visible to its author, to each listed recipient, and to
//! everyone when it has no recipients. Read state is kept per reader: a
//! PATCH only changes the caller's own flag and never the shared record.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use crm_rbac::{Capability, Mutation, ResourceKind};
use crm_records::{
    Collection, Identity, NewNotification, Notification, NotificationView, Recipient, RecordError,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentIdentity, IdPath};
use crate::routes::{list_newest_first, load, load_visible, Deleted};
use crate::state::AppState;

const VIEW: &[Capability] = &[Capability::ViewNotifications];
const MANAGE: &[Capability] = &[Capability::ManageNotifications];

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", patch(mark).delete(remove))
}

/// Body of a read-flag update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFlag {
    is_read: Option<bool>,
}

async fn list(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Vec<NotificationView>>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    let visible = list_newest_first(&state.store.notifications, scope).await;
    Ok(Json(state.store.read_receipts.views(visible, me.id).await))
}

async fn create(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    Body(input): Body<NewNotification>,
) -> ApiResult<(StatusCode, Json<NotificationView>)> {
    state.gate.require_any(&me, MANAGE)?;
    input.validate()?;

    let recipients = resolve_recipients(&state, &input.recipients).await?;
    let notification = input.into_notification(Recipient::from(&me), recipients)?;
    let saved = state.store.notifications.insert(notification).await?;

    tracing::info!(
        notification_id = %saved.id,
        author = %me.id,
        recipients = saved.recipients.len(),
        broadcast = saved.is_broadcast(),
        "notification sent"
    );
    Ok((StatusCode::CREATED, Json(saved.seen_as(false))))
}

/// Set the caller's read flag on a notification they can see.
async fn mark(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
    Body(flag): Body<ReadFlag>,
) -> ApiResult<Json<NotificationView>> {
    state.gate.require_any(&me, VIEW)?;
    let is_read = flag
        .is_read
        .ok_or_else(|| RecordError::invalid("isRead is required"))?;
    let notification = load_visible(&state.store.notifications, id, state.gate.scope(&me)).await?;

    state.store.read_receipts.mark(id, me.id, is_read).await;
    Ok(Json(notification.seen_as(is_read)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Deleted>> {
    state.gate.require_any(&me, MANAGE)?;
    let existing = load(&state.store.notifications, id).await?;
    state
        .gate
        .authorize_mutation(&me, ResourceKind::Notification, &existing, Mutation::Delete)?;

    state.store.notifications.remove(id).await?;
    state.store.read_receipts.forget(id).await;
    Ok(Deleted::new::<Notification>(id))
}

/// Look up each addressee, failing on the first unknown ID.
async fn resolve_recipients(state: &AppState, ids: &[Uuid]) -> ApiResult<Vec<Recipient>> {
    let mut recipients = Vec::with_capacity(ids.len());
    for id in ids {
        let identity: Identity = state
            .store
            .users
            .get(*id)
            .await
            .ok_or(RecordError::InvalidReference(ResourceKind::User))?;
        if recipients.iter().all(|r: &Recipient| r.id != identity.id) {
            recipients.push(Recipient::from(&identity));
        }
    }
    Ok(recipients)
}
