//! Subscription workflow, plus the subscriber CRUD surface, which is routed
//! but never opened to callers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};

use eventhub_core::SubscriberId;
use eventhub_infra::services::CrudService;
use eventhub_subscribers::Subscriber;

use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::authz::{Operation, authorize};
use crate::context::Identity;

pub fn subscriptions_router() -> Router {
    Router::new().route("/", post(subscribe_to))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_subscribers).put(update_subscriber))
        .route("/count", get(count_subscribers))
        .route("/:id", get(get_subscriber).delete(delete_subscriber))
}

/// POST /subscriptions
///
/// Open to anonymous callers. Only `event.id` of the body's event is used;
/// the stored event replaces the rest.
pub async fn subscribe_to(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
    body: Result<Json<Subscriber>, JsonRejection>,
) -> Result<Json<Subscriber>, ApiError> {
    authorize(Operation::SubscribeTo, &identity)?;
    let Json(candidate) = body.map_err(|e| ApiError::unreadable(e.body_text()))?;
    Ok(Json(services.subscribers.subscribe_to(candidate).await?))
}

/// GET /subscribers
pub async fn list_subscribers(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
    query: Result<Query<dto::ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Subscriber>>, ApiError> {
    authorize(Operation::ListSubscribers, &identity)?;
    let Query(query) = query.map_err(|e| ApiError::unreadable(e.body_text()))?;
    let page = query.to_page_request()?;
    Ok(Json(services.subscribers.list(&page).await?))
}

/// GET /subscribers/count
pub async fn count_subscribers(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
) -> Result<Json<dto::CountResponse>, ApiError> {
    authorize(Operation::CountSubscribers, &identity)?;
    let count = services.subscribers.count().await?;
    Ok(Json(dto::CountResponse { count }))
}

/// GET /subscribers/:id
pub async fn get_subscriber(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
    Path(id): Path<String>,
) -> Result<Json<Option<Subscriber>>, ApiError> {
    authorize(Operation::GetSubscriber, &identity)?;
    let id: SubscriberId = id.parse()?;
    Ok(Json(services.subscribers.get(id).await?))
}

/// PUT /subscribers
pub async fn update_subscriber(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
    body: Result<Json<Subscriber>, JsonRejection>,
) -> Result<Json<Subscriber>, ApiError> {
    authorize(Operation::UpdateSubscriber, &identity)?;
    let Json(subscriber) = body.map_err(|e| ApiError::unreadable(e.body_text()))?;
    Ok(Json(services.subscribers.update(subscriber).await?))
}

/// DELETE /subscribers/:id
pub async fn delete_subscriber(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize(Operation::DeleteSubscriber, &identity)?;
    let id: SubscriberId = id.parse()?;
    services.subscribers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
