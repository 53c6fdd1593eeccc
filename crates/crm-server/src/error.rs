//! HTTP error responses
//!
//! Every failure leaves the server as
//! `{ "success": false, "message", "code", "timestamp" }`, plus `errors` for
//! validation failures. Server-side failures are logged and answered with a
//! generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use crm_auth::AuthError;
use crm_rbac::AuthorizationError;
use crm_records::RecordError;
use serde::Serialize;
use thiserror::Error;

/// Any error a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authenticated but not allowed.
    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),

    /// Validation or storage failure.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Request could not be read.
    #[error("{0}")]
    BadRequest(String),

    /// No route matched.
    #[error("Route not found.")]
    RouteNotFound,

    /// Unexpected server failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: String,
    code: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    errors: &'a [String],
    timestamp: String,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        let code = match self {
            ApiError::Auth(e) => e.status_code(),
            ApiError::Forbidden(e) => e.status_code(),
            ApiError::Record(e) => e.status_code(),
            ApiError::BadRequest(_) => 400,
            ApiError::RouteNotFound => 404,
            ApiError::Internal(_) => 500,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.error_code(),
            ApiError::Forbidden(e) => e.error_code(),
            ApiError::Record(e) => e.error_code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::RouteNotFound => "ROUTE_NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_server_error(&self) -> bool {
        match self {
            ApiError::Auth(e) => e.is_server_error(),
            ApiError::Internal(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "An internal error occurred.".to_string()
        } else {
            self.to_string()
        };

        let errors = match &self {
            ApiError::Record(e) => e.details(),
            _ => &[],
        };

        let body = ErrorBody {
            success: false,
            message,
            code: self.code(),
            errors,
            timestamp: Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_rbac::{Mutation, ResourceKind};

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(AuthError::MissingToken).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthorizationError::NotOwner {
                resource: ResourceKind::Client,
                mutation: Mutation::Delete,
            })
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(RecordError::NotFound(ResourceKind::Call)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::RouteNotFound.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_internal_message_is_not_leaked() {
        let response = ApiError::Internal("database exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "An internal error occurred.");
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_validation_errors_are_listed() {
        let error = RecordError::Validation(vec!["title is required".into()]);
        let response = ApiError::from(error).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0], "title is required");
    }
}
