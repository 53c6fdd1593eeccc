//! Client routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use crm_rbac::{Capability, Mutation, ResourceKind};
use crm_records::{Client, ClientPatch, Collection, NewClient, RecordError};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentIdentity, IdPath, QueryParams};
use crate::routes::{list_newest_first, load, load_visible, Deleted};
use crate::state::AppState;

const VIEW: &[Capability] = &[Capability::ViewClients];
const MANAGE: &[Capability] = &[Capability::ManageClients, Capability::ManageOwnClients];

/// Most results a search returns.
const SEARCH_LIMIT: usize = 20;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/search", get(search))
        .route("/:id", get(fetch).put(update).delete(remove))
}

/// Search parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Vec<Client>>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    Ok(Json(list_newest_first(&state.store.clients, scope).await))
}

/// Case-insensitive search over company, contact, and email.
async fn search(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    QueryParams(params): QueryParams<SearchQuery>,
) -> ApiResult<Json<Vec<Client>>> {
    state.gate.require_any(&me, VIEW)?;
    let needle = params
        .query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| RecordError::invalid("query is required"))?;

    let scope = state.gate.scope(&me);
    let mut found = state
        .store
        .clients
        .find(&|c: &Client| scope.permits(c) && c.matches(&needle))
        .await;
    found.reverse();
    found.truncate(SEARCH_LIMIT);
    Ok(Json(found))
}

async fn fetch(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Client>> {
    state.gate.require_any(&me, VIEW)?;
    let client = load_visible(&state.store.clients, id, state.gate.scope(&me)).await?;
    Ok(Json(client))
}

async fn create(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    Body(input): Body<NewClient>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    state.gate.require_any(&me, MANAGE)?;
    let client = input.into_client(me.id)?;
    let email = client.email.clone();

    let saved = state
        .store
        .clients
        .insert_unique(client, "email", &|c: &Client| c.email == email)
        .await?;

    tracing::info!(client_id = %saved.id, created_by = %me.id, "client created");
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn update(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
    Body(patch): Body<ClientPatch>,
) -> ApiResult<Json<Client>> {
    state.gate.require_any(&me, MANAGE)?;
    let existing = load(&state.store.clients, id).await?;
    state
        .gate
        .authorize_mutation(&me, ResourceKind::Client, &existing, Mutation::Update)?;

    let updated = state
        .store
        .clients
        .update_unique(
            id,
            "email",
            &|a: &Client, b: &Client| a.email == b.email,
            Box::new(move |client: &mut Client| patch.apply(client)),
        )
        .await?;
    Ok(Json(updated))
}

async fn remove(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Deleted>> {
    state.gate.require_any(&me, MANAGE)?;
    let existing = load(&state.store.clients, id).await?;
    state
        .gate
        .authorize_mutation(&me, ResourceKind::Client, &existing, Mutation::Delete)?;

    state.store.clients.remove(id).await?;
    tracing::info!(client_id = %id, by = %me.id, "client deleted");
    Ok(Deleted::new::<Client>(id))
}
