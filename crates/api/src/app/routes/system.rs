use axum::{Json, http::StatusCode};

use eventhub_auth::{UserInfo, current_user};

use crate::app::errors::ApiError;
use crate::authz::{Operation, authorize};
use crate::context::Identity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /user-info
///
/// Name and authorities of the caller, for client-side session bootstrap.
pub async fn user_info(Identity(identity): Identity) -> Result<Json<UserInfo>, ApiError> {
    authorize(Operation::CurrentUser, &identity)?;
    Ok(Json(current_user(&identity)?))
}
