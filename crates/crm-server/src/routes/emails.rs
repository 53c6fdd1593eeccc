//! Recorded email routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use crm_rbac::{Capability, Mutation, ResourceKind};
use crm_records::{Collection, Email, NewEmail};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentIdentity, IdPath};
use crate::routes::{list_newest_first, load, Deleted};
use crate::state::AppState;

const VIEW: &[Capability] = &[Capability::ViewEmails];
const SEND: &[Capability] = &[Capability::SendEmails];

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", delete(remove))
}

async fn list(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Vec<Email>>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    Ok(Json(list_newest_first(&state.store.emails, scope).await))
}

async fn create(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    Body(input): Body<NewEmail>,
) -> ApiResult<(StatusCode, Json<Email>)> {
    state.gate.require_any(&me, SEND)?;
    let email = state.store.emails.insert(input.into_email(me.id)?).await?;
    tracing::info!(email_id = %email.id, created_by = %me.id, "email recorded");
    Ok((StatusCode::CREATED, Json(email)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Deleted>> {
    state.gate.require_any(&me, SEND)?;
    let existing = load(&state.store.emails, id).await?;
    state
        .gate
        .authorize_mutation(&me, ResourceKind::Email, &existing, Mutation::Delete)?;

    state.store.emails.remove(id).await?;
    Ok(Deleted::new::<Email>(id))
}
