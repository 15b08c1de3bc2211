use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use eventhub_auth::{AuthError, LoginError, TokenIssueError};
use eventhub_core::DomainError;
use eventhub_infra::services::ServiceError;

/// Everything a handler can fail with; rendered as `{"error", "message"}`.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    Auth(AuthError),
    /// Path identifier that is not an integer.
    InvalidId(String),
    Login(LoginError),
    TokenIssue(TokenIssueError),
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        ApiError::Service(value)
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        ApiError::Auth(value)
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidId(msg) => ApiError::InvalidId(msg),
            other => ApiError::Service(other.into()),
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(value: LoginError) -> Self {
        ApiError::Login(value)
    }
}

impl From<TokenIssueError> for ApiError {
    fn from(value: TokenIssueError) -> Self {
        ApiError::TokenIssue(value)
    }
}

impl ApiError {
    /// Unreadable request body or query string.
    pub fn unreadable(msg: impl Into<String>) -> Self {
        ApiError::Service(ServiceError::Validation(msg.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Service(ServiceError::Validation(msg)) => {
                json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_failed", msg)
            }
            ApiError::Service(ServiceError::NotFound(msg)) => {
                json_error(StatusCode::NOT_FOUND, "not_found", msg)
            }
            ApiError::Service(ServiceError::Conflict(msg)) => {
                json_error(StatusCode::CONFLICT, "conflict", msg)
            }
            ApiError::Service(ServiceError::Storage(msg)) => {
                error!(error = %msg, "storage failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
            }
            ApiError::Auth(AuthError::Unauthenticated) => json_error(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "authentication required",
            ),
            ApiError::Auth(AuthError::Forbidden(msg)) => {
                json_error(StatusCode::FORBIDDEN, "forbidden", msg)
            }
            ApiError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
            ApiError::Login(e) => json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string()),
            ApiError::TokenIssue(e) => {
                error!(error = %e, "token signing failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_error", e.to_string())
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
