//! Appointment routes
//!
//! Appointments are owned by whoever scheduled them and are also visible to
//! the attending agent. Lists are sorted by start time.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use crm_rbac::{Capability, Mutation, ResourceKind};
use crm_records::{Appointment, AppointmentPatch, Collection, NewAppointment};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentIdentity, IdPath};
use crate::routes::{load, load_visible, require_reference, Deleted};
use crate::state::AppState;

const VIEW: &[Capability] = &[Capability::ViewAppointments];
const MANAGE: &[Capability] = &[Capability::ManageAppointments, Capability::ManageOwnAppointments];

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(fetch).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Vec<Appointment>>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    let mut found = state
        .store
        .appointments
        .find(&|a: &Appointment| scope.permits(a))
        .await;
    found.sort_by_key(|a| a.start_time);
    Ok(Json(found))
}

async fn fetch(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Appointment>> {
    state.gate.require_any(&me, VIEW)?;
    let appointment = load_visible(&state.store.appointments, id, state.gate.scope(&me)).await?;
    Ok(Json(appointment))
}

/// Schedule an appointment.
///
/// The attending agent defaults to the caller; naming someone else requires
/// an administrative role.
async fn create(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    Body(input): Body<NewAppointment>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    state.gate.require_any(&me, MANAGE)?;
    input.validate()?;

    let agent = input.agent.unwrap_or(me.id);
    if agent != me.id {
        state.gate.require_admin(&me)?;
        require_reference(&state.store.users, Some(agent)).await?;
    }
    require_reference(&state.store.clients, input.client).await?;

    let appointment = state
        .store
        .appointments
        .insert(input.into_appointment(agent, me.id)?)
        .await?;
    tracing::info!(
        appointment_id = %appointment.id,
        client_id = %appointment.client,
        agent = %agent,
        "appointment scheduled"
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

async fn update(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
    Body(patch): Body<AppointmentPatch>,
) -> ApiResult<Json<Appointment>> {
    state.gate.require_any(&me, MANAGE)?;
    let existing = load(&state.store.appointments, id).await?;
    state
        .gate
        .authorize_mutation(&me, ResourceKind::Appointment, &existing, Mutation::Update)?;

    let editor = me.id;
    let updated = state
        .store
        .appointments
        .update(id, Box::new(move |a: &mut Appointment| patch.apply(a, editor)))
        .await?;
    Ok(Json(updated))
}

async fn remove(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<Deleted>> {
    state.gate.require_any(&me, MANAGE)?;
    let existing = load(&state.store.appointments, id).await?;
    state
        .gate
        .authorize_mutation(&me, ResourceKind::Appointment, &existing, Mutation::Delete)?;

    state.store.appointments.remove(id).await?;
    tracing::info!(appointment_id = %id, by = %me.id, "appointment deleted");
    Ok(Deleted::new::<Appointment>(id))
}
