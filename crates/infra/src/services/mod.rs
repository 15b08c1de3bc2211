//! Domain service layer.
//!
//! [`CrudService`] gives every entity the same paging/sorting CRUD contract
//! over a [`Repository`]. Entity-specific services add their own operations
//! on top ([`EventService::find_all`], [`SubscriberService::subscribe_to`]).

use thiserror::Error;
use tracing::{debug, info};

use eventhub_core::{DomainError, Entity, PageRequest};

use crate::repository::{Repository, StoreError};

pub mod events;
pub mod subscribers;

pub use events::EventService;
pub use subscribers::SubscriberService;

/// Service-level error, the only error kind the API layer sees from services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The entity or request failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Stale version on update.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Backend failure, propagated unchanged.
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            e @ StoreError::NotFound { .. } => ServiceError::NotFound(e.to_string()),
            StoreError::Concurrency(msg) => ServiceError::Conflict(msg),
            StoreError::InvalidQuery(msg) => ServiceError::Validation(msg),
            e @ StoreError::MissingReference(_) => ServiceError::NotFound(e.to_string()),
            StoreError::Backend(msg) => ServiceError::Storage(msg),
        }
    }
}

/// Paging/sorting CRUD contract shared by every entity service.
///
/// Implementors only provide [`CrudService::repository`].
#[async_trait::async_trait]
pub trait CrudService<T>: Send + Sync
where
    T: Entity + Send + 'static,
{
    fn repository(&self) -> &dyn Repository<T>;

    /// One page of entities, ordered by `page.sort_orders` then ascending id.
    async fn list(&self, page: &PageRequest) -> ServiceResult<Vec<T>> {
        page.validate()?;
        let items = self.repository().find_page(page).await?;
        debug!(kind = T::KIND, offset = page.offset, limit = page.limit, returned = items.len(), "listed page");
        Ok(items)
    }

    /// `None` for a missing id; never an error.
    async fn get(&self, id: T::Id) -> ServiceResult<Option<T>> {
        let found = self.repository().find_by_id(id).await?;
        debug!(kind = T::KIND, id = %id, found = found.is_some(), "get by id");
        Ok(found)
    }

    /// Validate, then create (no id) or version-guarded replace (id present).
    async fn update(&self, entity: T) -> ServiceResult<T> {
        entity.validate()?;
        let creating = entity.id().is_none();

        let saved = self.repository().save(entity).await?;

        let id = saved.id().map(|id| id.to_string()).unwrap_or_default();
        if creating {
            info!(kind = T::KIND, id = %id, version = saved.version(), "created");
        } else {
            info!(kind = T::KIND, id = %id, version = saved.version(), "updated");
        }
        Ok(saved)
    }

    /// Remove by id; `NotFound` when absent.
    async fn delete(&self, id: T::Id) -> ServiceResult<()> {
        self.repository().delete_by_id(id).await?;
        info!(kind = T::KIND, id = %id, "deleted");
        Ok(())
    }

    async fn count(&self) -> ServiceResult<u64> {
        Ok(self.repository().count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_service_taxonomy() {
        assert!(matches!(
            ServiceError::from(StoreError::not_found("event", 7)),
            ServiceError::NotFound(msg) if msg == "event 7 not found"
        ));
        assert_eq!(
            ServiceError::from(StoreError::Concurrency("stale".into())),
            ServiceError::Conflict("stale".into())
        );
        assert_eq!(
            ServiceError::from(StoreError::InvalidQuery("bad sort".into())),
            ServiceError::Validation("bad sort".into())
        );
        assert!(matches!(
            ServiceError::from(StoreError::MissingReference("event 3".into())),
            ServiceError::NotFound(_)
        ));
        assert_eq!(
            ServiceError::from(StoreError::Backend("down".into())),
            ServiceError::Storage("down".into())
        );
    }

    #[test]
    fn invalid_ids_are_validation_failures() {
        assert!(matches!(
            ServiceError::from(DomainError::invalid_id("abc")),
            ServiceError::Validation(_)
        ));
    }
}
