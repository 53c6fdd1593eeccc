//! Call routes
//!
//! Calls are owned by their agent. Lists are sorted by call date, newest
//! first.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use crm_rbac::{Capability, Mutation, OwnershipScope, ResourceKind};
use crm_records::{Call, CallPatch, Collection, MemoryCollection, NewCall};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentIdentity, IdPath};
use crate::routes::{load, load_visible, require_reference, Deleted};
use crate::state::AppState;

const VIEW: &[Capability] = &[Capability::ViewCalls];
const CREATE: &[Capability] = &[Capability::ManageCalls];
const MANAGE: &[Capability] = &[Capability::ManageCalls, Capability::ManageOwnCalls];

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/client/:client_id", get(for_client))
        .route("/:id", get(fetch).put(update).delete(remove))
}

async fn by_date(
    calls: &MemoryCollection<Call>,
    scope: OwnershipScope,
    client: Option<Uuid>,
) -> Vec<Call> {
    let mut found = calls
        .find(&|c: &Call| scope.permits(c) && client.map_or(true, |id| c.client == id))
        .await;
    found.sort_by(|a, b| b.date.cmp(&a.date));
    found
}

async fn list(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Vec<Call>>> {
    state.gate.require_any(&me, VIEW)?;
    Ok(Json(by_date(&state.store.calls, state.gate.scope(&me), None).await))
}

/// Call history for one client.
async fn for_client(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(client_id): IdPath<Uuid>,
) -> ApiResult<Json<Vec<Call>>> {
    state.gate.require_any(&me, VIEW)?;
    Ok(Json(
        by_date(&state.store.calls, state.gate.scope(&me), Some(client_id)).await,
    ))
}

async fn fetch(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Call>> {
    state.gate.require_any(&me, VIEW)?;
    let call = load_visible(&state.store.calls, id, state.gate.scope(&me)).await?;
    Ok(Json(call))
}

/// Log a call placed by the caller.
async fn create(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    Body(input): Body<NewCall>,
) -> ApiResult<(StatusCode, Json<Call>)> {
    state.gate.require_any(&me, CREATE)?;
    input.validate()?;
    require_reference(&state.store.clients, input.client).await?;

    let call = state.store.calls.insert(input.into_call(me.id, me.id)?).await?;
    tracing::info!(call_id = %call.id, client_id = %call.client, agent = %me.id, "call logged");
    Ok((StatusCode::CREATED, Json(call)))
}

async fn update(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
    Body(patch): Body<CallPatch>,
) -> ApiResult<Json<Call>> {
    state.gate.require_any(&me, MANAGE)?;
    let existing = load(&state.store.calls, id).await?;
    state
        .gate
        .authorize_mutation(&me, ResourceKind::Call, &existing, Mutation::Update)?;

    let editor = me.id;
    let updated = state
        .store
        .calls
        .update(id, Box::new(move |call: &mut Call| patch.apply(call, editor)))
        .await?;
    Ok(Json(updated))
}

async fn remove(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Deleted>> {
    state.gate.require_any(&me, MANAGE)?;
    let existing = load(&state.store.calls, id).await?;
    state
        .gate
        .authorize_mutation(&me, ResourceKind::Call, &existing, Mutation::Delete)?;

    state.store.calls.remove(id).await?;
    tracing::info!(call_id = %id, by = %me.id, "call deleted");
    Ok(Deleted::new::<Call>(id))
}
