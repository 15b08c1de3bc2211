use std::sync::Arc;

use tracing::debug;

use eventhub_events::Event;

use super::{CrudService, ServiceResult};
use crate::repository::Repository;

/// CRUD over events, plus the unpaged listing.
#[derive(Clone)]
pub struct EventService {
    repository: Arc<dyn Repository<Event>>,
}

impl EventService {
    pub fn new(repository: Arc<dyn Repository<Event>>) -> Self {
        Self { repository }
    }

    /// Every event, unfiltered and unpaged, in ascending id order.
    pub async fn find_all(&self) -> ServiceResult<Vec<Event>> {
        let events = self.repository.find_all().await?;
        debug!(returned = events.len(), "listed all events");
        Ok(events)
    }
}

#[async_trait::async_trait]
impl CrudService<Event> for EventService {
    fn repository(&self) -> &dyn Repository<Event> {
        self.repository.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryDatabase;
    use crate::services::ServiceError;
    use eventhub_core::{EventId, PageRequest, SortOrder};

    fn service() -> EventService {
        EventService::new(Arc::new(InMemoryDatabase::new().events()))
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_storage() {
        let svc = service();
        let err = svc.update(Event::new("  ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("name")));
        assert_eq!(svc.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_all_is_ascending_by_id() {
        let svc = service();
        for name in ["b", "a", "c"] {
            svc.update(Event::new(name)).await.unwrap();
        }

        let ids: Vec<i64> = svc
            .find_all()
            .await
            .unwrap()
            .iter()
            .filter_map(|e| e.id.map(EventId::get))
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn list_rejects_zero_limit_and_unknown_sort() {
        let svc = service();

        let zero = PageRequest {
            offset: 0,
            limit: 0,
            sort_orders: vec![],
        };
        assert!(matches!(svc.list(&zero).await, Err(ServiceError::Validation(_))));

        let unknown = PageRequest::new(0, 10, vec![SortOrder::asc("nbAttendees")]).unwrap();
        assert!(matches!(svc.list(&unknown).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        assert_eq!(service().get(EventId::new(42)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        assert!(matches!(
            service().delete(EventId::new(42)).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
