use std::sync::Arc;

use tracing::{info, instrument, warn};

use eventhub_subscribers::Subscriber;

use super::{CrudService, EventService, ServiceError, ServiceResult};
use crate::repository::Repository;

/// CRUD over subscribers, plus the subscription workflow.
#[derive(Clone)]
pub struct SubscriberService {
    repository: Arc<dyn Repository<Subscriber>>,
    events: Arc<EventService>,
}

impl SubscriberService {
    pub fn new(repository: Arc<dyn Repository<Subscriber>>, events: Arc<EventService>) -> Self {
        Self { repository, events }
    }

    /// Register `candidate` for the event it references.
    ///
    /// Only the event id of `candidate.event` is trusted: the event is
    /// re-read and the stored copy replaces whatever the caller sent. An
    /// unknown event fails with `NotFound` before anything is written.
    ///
    /// Always creates a new registration: a caller-supplied `id` and
    /// `version` are dropped, so an existing subscriber is never replaced.
    #[instrument(skip(self, candidate), fields(event_id = ?candidate.event_id()))]
    pub async fn subscribe_to(&self, mut candidate: Subscriber) -> ServiceResult<Subscriber> {
        let event_id = candidate
            .event_id()
            .ok_or_else(|| ServiceError::Validation("event: is required".to_string()))?;

        let Some(event) = self.events.get(event_id).await? else {
            warn!("subscription to unknown event");
            return Err(ServiceError::NotFound(format!("event {event_id} not found")));
        };

        if candidate.id.take().is_some() {
            warn!("ignoring caller-supplied subscriber id");
        }
        candidate.version = 0;
        candidate.event = Some(event);
        let subscriber = self.update(candidate).await?;
        info!(subscriber_id = ?subscriber.id, "subscribed");
        Ok(subscriber)
    }
}

#[async_trait::async_trait]
impl CrudService<Subscriber> for SubscriberService {
    fn repository(&self) -> &dyn Repository<Subscriber> {
        self.repository.as_ref()
    }
}
