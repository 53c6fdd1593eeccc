//! Request extractors
//!
//! [`CurrentIdentity`] runs credential verification before any handler body.
//! [`Body`] and [`IdPath`] turn axum's rejections into [`ApiError`] so every
//! failure shares one JSON shape.

use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use crm_records::Identity;

use crate::error::ApiError;
use crate::state::{AppState, Verifier};

/// The verified caller.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let result = match Verifier::extract_bearer(header) {
            Ok(token) => state.verifier.verify(token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(identity) => Ok(CurrentIdentity(identity)),
            Err(e) => {
                tracing::info!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    code = e.error_code(),
                    "authentication failed"
                );
                Err(e.into())
            }
        }
    }
}

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Body<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct IdPath<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
