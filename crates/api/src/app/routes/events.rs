//! Event CRUD endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::get,
};

use eventhub_core::EventId;
use eventhub_events::Event;
use eventhub_infra::services::CrudService;

use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::authz::{Operation, authorize};
use crate::context::Identity;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_events).put(update_event))
        .route("/all", get(find_all_events))
        .route("/count", get(count_events))
        .route("/:id", get(get_event).delete(delete_event))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /events?offset=0&limit=50&sort=eventDate:desc,name
///
/// One page of events. `sort` lists `path[:asc|desc]` items in priority
/// order; ties always fall back to ascending id.
pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
    query: Result<Query<dto::ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Event>>, ApiError> {
    authorize(Operation::ListEvents, &identity)?;
    let Query(query) = query.map_err(|e| ApiError::unreadable(e.body_text()))?;

    let page = query.to_page_request()?;
    Ok(Json(services.events.list(&page).await?))
}

/// GET /events/all
pub async fn find_all_events(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
) -> Result<Json<Vec<Event>>, ApiError> {
    authorize(Operation::FindAllEvents, &identity)?;
    Ok(Json(services.events.find_all().await?))
}

/// GET /events/count
pub async fn count_events(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
) -> Result<Json<dto::CountResponse>, ApiError> {
    authorize(Operation::CountEvents, &identity)?;
    let count = services.events.count().await?;
    Ok(Json(dto::CountResponse { count }))
}

/// GET /events/:id
///
/// A missing event is `200 null`, not 404.
pub async fn get_event(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
    Path(id): Path<String>,
) -> Result<Json<Option<Event>>, ApiError> {
    authorize(Operation::GetEvent, &identity)?;
    let id: EventId = id.parse()?;
    Ok(Json(services.events.get(id).await?))
}

/// PUT /events
///
/// Create (no `id`) or version-guarded replace. `nbAttendees` in the body is
/// ignored.
pub async fn update_event(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
    body: Result<Json<Event>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
    authorize(Operation::UpdateEvent, &identity)?;
    let Json(event) = body.map_err(|e| ApiError::unreadable(e.body_text()))?;
    Ok(Json(services.events.update(event).await?))
}

/// DELETE /events/:id
///
/// Subscribers of the event are deleted with it.
pub async fn delete_event(
    Extension(services): Extension<Arc<AppServices>>,
    Identity(identity): Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize(Operation::DeleteEvent, &identity)?;
    let id: EventId = id.parse()?;
    services.events.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
