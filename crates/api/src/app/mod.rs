//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use eventhub_auth::Hs256JwtValidator;
use eventhub_infra::config::AppConfig;
use eventhub_infra::repository::StoreError;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StoreError> {
    let services = services::AppServices::from_config(config).await?;
    Ok(build_app_with(services, &config.jwt_secret))
}

/// Build the router over already-constructed services.
pub fn build_app_with(services: services::AppServices, jwt_secret: &str) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(jwt_secret));
    let auth_state = middleware::AuthState { jwt };
    let services = Arc::new(services);

    // Domain operations: identity bound first, access checked per handler.
    let operations = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::identity_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/login", post(routes::login::login))
        .merge(operations)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(services)),
        )
}
