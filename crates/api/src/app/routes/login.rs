use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::rejection::JsonRejection,
};
use chrono::Utc;
use tracing::{info, warn};

use eventhub_auth::IssuedToken;

use crate::app::{dto, errors::ApiError, services::AppServices};

/// POST /login `{"username", "password"}`
///
/// Exchange directory credentials for a bearer token.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Result<Json<IssuedToken>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::unreadable(e.body_text()))?;

    let principal = services
        .users
        .authenticate(&body.username, &body.password)
        .inspect_err(|_| warn!(username = %body.username, "login rejected"))?;

    let token = services.tokens.issue(&principal, Utc::now())?;
    info!(username = %principal.name, expires_at = %token.expires_at, "login succeeded");
    Ok(Json(token))
}
