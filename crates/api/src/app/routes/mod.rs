use axum::{Router, routing::get};

pub mod events;
pub mod login;
pub mod subscribers;
pub mod system;

/// Router for every operation that goes through access checks.
pub fn router() -> Router {
    Router::new()
        .route("/user-info", get(system::user_info))
        .nest("/events", events::router())
        .nest("/subscriptions", subscribers::subscriptions_router())
        .nest("/subscribers", subscribers::router())
}
