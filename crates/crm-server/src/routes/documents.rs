//! Document metadata routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use crm_rbac::{Capability, Mutation, ResourceKind};
use crm_records::{Collection, Document, NewDocument};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentIdentity, IdPath};
use crate::routes::{list_newest_first, load, load_visible, Deleted};
use crate::state::AppState;

const VIEW: &[Capability] = &[Capability::ViewDocuments];
const MANAGE: &[Capability] = &[Capability::ManageOwnDocuments, Capability::ManageDocuments];

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Vec<Document>>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    Ok(Json(list_newest_first(&state.store.documents, scope).await))
}

async fn fetch(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Document>> {
    state.gate.require_any(&me, VIEW)?;
    let document = load_visible(&state.store.documents, id, state.gate.scope(&me)).await?;
    Ok(Json(document))
}

async fn create(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    Body(input): Body<NewDocument>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    state.gate.require_any(&me, MANAGE)?;
    let document = state.store.documents.insert(input.into_document(me.id)?).await?;
    tracing::info!(document_id = %document.id, uploaded_by = %me.id, "document registered");
    Ok((StatusCode::CREATED, Json(document)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Deleted>> {
    state.gate.require_any(&me, MANAGE)?;
    let existing = load(&state.store.documents, id).await?;
    state
        .gate
        .authorize_mutation(&me, ResourceKind::Document, &existing, Mutation::Delete)?;

    state.store.documents.remove(id).await?;
    tracing::info!(document_id = %id, by = %me.id, "document deleted");
    Ok(Deleted::new::<Document>(id))
}
