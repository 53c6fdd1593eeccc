//! # CRM Server
//!
//! HTTP host for the CRM backend.
//!
//! ## Overview
//!
//! The crm-server crate handles:
//! - **Routing**: JSON endpoints for accounts, clients, calls, appointments,
//!   documents, notifications, emails and statistics
//! - **Authentication**: Bearer tokens verified by an extractor before any
//!   handler runs
//! - **Authorization**: Capability and ownership checks through
//!   [`crm_rbac::AccessGate`]
//! - **Configuration**: Environment-driven [`ServerConfig`]
//! - **Logging**: `tracing` with human or JSON output
//!
//! ## Request flow
//!
//! ```text
//! request ─▶ TraceLayer ─▶ CorsLayer ─▶ router
//!                                         │
//!             CurrentIdentity (JWT + account lookup) ── 401
//!                                         │
//!             gate.require_any(capabilities) ────────── 403
//!                                         │
//!             load record / scope filter ────────────── 404
//!                                         │
//!             gate.authorize_mutation(owner) ────────── 403
//!                                         │
//!                                   store operation
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use crm_auth::{JwtService, PasswordHasher};
//! use crm_records::Store;
//! use crm_server::{app, AppState};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let jwt = JwtService::with_secret("a-secret-of-at-least-thirty-two-bytes")?;
//! let state = AppState::new(Store::new(), jwt, PasswordHasher::default());
//! let router = app(state, &["http://localhost:5173".to_string()]);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::{AdminBootstrap, ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use logging::LogFormat;
pub use state::AppState;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete application router.
///
/// # Arguments
///
/// * `state` - Shared handler state
/// * `cors_origins` - Browser origins allowed to call the API; entries that
///   are not valid header values are skipped
pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    routes::api()
        .fallback(routes::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors(cors_origins)),
        )
        .with_state(state)
}

fn cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
