//! Registration, login, and user administration

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use crm_rbac::{Capability, Role};
use crm_records::{Collection, Identity, IdentityPatch, IdentityProfile, NewIdentity, RecordError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, CurrentIdentity, IdPath};
use crate::state::AppState;

const MANAGE_USERS: &[Capability] = &[Capability::ManageUsers];

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/profile", get(me))
        .route("/users", get(list_users))
        .route("/agents", get(list_agents))
        .route("/users/:id", put(update_user))
        .route("/users/:id/capabilities/reset", post(reset_capabilities))
}

/// Login input.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

/// Login output: the caller's profile and a bearer token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    profile: IdentityProfile,
    token: String,
    expires_in: i64,
}

/// Self-registration. The new account is always an agent.
async fn register(
    State(state): State<AppState>,
    Body(input): Body<NewIdentity>,
) -> ApiResult<(StatusCode, Json<IdentityProfile>)> {
    input.validate()?;
    let name = input.name.unwrap_or_default();
    let email = input.email.unwrap_or_default();
    let password = input.password.unwrap_or_default();

    let identity = state
        .create_identity(&name, &email, &password, Role::Agent)
        .await?;
    Ok((StatusCode::CREATED, Json(identity.profile())))
}

async fn login(
    State(state): State<AppState>,
    Body(input): Body<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (input.email, input.password) else {
        return Err(RecordError::invalid("email and password are required").into());
    };

    let identity = state
        .verifier
        .check_password(&email, &password, &state.hasher)
        .await?;

    let identity = state
        .store
        .users
        .update(
            identity.id,
            Box::new(|user: &mut Identity| {
                user.touch_login();
                Ok(())
            }),
        )
        .await?;

    let token = state.jwt().issue_token(identity.id)?;
    tracing::info!(identity_id = %identity.id, "login succeeded");

    Ok(Json(LoginResponse {
        profile: identity.profile(),
        token,
        expires_in: state.jwt().config().token_duration.num_seconds(),
    }))
}

async fn me(CurrentIdentity(me): CurrentIdentity) -> Json<IdentityProfile> {
    Json(me.profile())
}

async fn list_users(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Vec<IdentityProfile>>> {
    state.gate.require_any(&me, MANAGE_USERS)?;
    let users = state.store.users.find(&|_| true).await;
    Ok(Json(users.iter().map(Identity::profile).collect()))
}

async fn list_agents(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Vec<IdentityProfile>>> {
    state.gate.require_any(&me, MANAGE_USERS)?;
    let agents = state
        .store
        .users
        .find(&|u: &Identity| u.role == Role::Agent)
        .await;
    Ok(Json(agents.iter().map(Identity::profile).collect()))
}

/// Administrative edit: name, role, and active flag only.
async fn update_user(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
    Body(patch): Body<IdentityPatch>,
) -> ApiResult<Json<IdentityProfile>> {
    state.gate.require_any(&me, MANAGE_USERS)?;
    if id == me.id && patch.is_active == Some(false) {
        return Err(ApiError::BadRequest("You cannot disable your own account.".to_string()));
    }

    let updated = state
        .store
        .users
        .update(id, Box::new(move |user: &mut Identity| patch.apply(user)))
        .await?;

    tracing::info!(
        identity_id = %updated.id,
        by = %me.id,
        role = updated.role.as_str(),
        active = updated.is_active,
        "account updated"
    );
    Ok(Json(updated.profile()))
}

/// Replace a user's capabilities with the defaults of its current role.
async fn reset_capabilities(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
    IdPath(id): IdPath<Uuid>,
) -> ApiResult<Json<IdentityProfile>> {
    state.gate.require_any(&me, MANAGE_USERS)?;

    let table = state.table.clone();
    let updated = state
        .store
        .users
        .update(
            id,
            Box::new(move |user: &mut Identity| {
                user.rederive_capabilities(&table);
                Ok(())
            }),
        )
        .await?;

    tracing::info!(identity_id = %updated.id, by = %me.id, "capabilities re-derived from role");
    Ok(Json(updated.profile()))
}
