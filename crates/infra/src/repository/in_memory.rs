//! In-memory repositories.
//!
//! Two `RwLock`-guarded tables keyed by id, with the same semantics as the
//! Postgres store: live attendee counts, version-guarded replaces, cascading
//! event deletes and a foreign-key check on subscriber writes.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use eventhub_core::query::{sort_items, window};
use eventhub_core::{DomainError, Entity, EventId, PageRequest, Sortable, SubscriberId, Version};
use eventhub_events::Event;
use eventhub_subscribers::Subscriber;

use super::{Repository, StoreError};

/// Stored subscriber: the entity without its nested event, plus the key.
#[derive(Debug, Clone)]
struct SubscriberRow {
    subscriber: Subscriber,
    event_id: EventId,
}

#[derive(Debug, Default)]
struct Tables {
    last_event_id: i64,
    last_subscriber_id: i64,
    events: BTreeMap<EventId, Event>,
    subscribers: BTreeMap<SubscriberId, SubscriberRow>,
}

impl Tables {
    fn attendees(&self, event_id: EventId) -> u64 {
        self.subscribers
            .values()
            .filter(|row| row.event_id == event_id)
            .count() as u64
    }

    fn load_event(&self, stored: &Event) -> Event {
        let mut event = stored.clone();
        event.nb_attendees = stored.id.map(|id| self.attendees(id)).unwrap_or(0);
        event
    }

    fn load_subscriber(&self, row: &SubscriberRow) -> Result<Subscriber, StoreError> {
        let event = self
            .events
            .get(&row.event_id)
            .map(|e| self.load_event(e))
            .ok_or_else(|| StoreError::Backend(format!("dangling event reference {}", row.event_id)))?;

        let mut subscriber = row.subscriber.clone();
        subscriber.event = Some(event);
        Ok(subscriber)
    }
}

fn check_version(kind: &str, id: impl core::fmt::Display, stored: Version, given: Version) -> Result<(), StoreError> {
    if stored == given {
        Ok(())
    } else {
        Err(StoreError::Concurrency(format!(
            "{kind} {id}: expected version {given}, found {stored}"
        )))
    }
}

fn invalid_query(err: DomainError) -> StoreError {
    match err {
        DomainError::Validation(msg) | DomainError::InvalidId(msg) => StoreError::InvalidQuery(msg),
    }
}

fn sorted_page<T: Sortable>(mut items: Vec<T>, page: &PageRequest) -> Result<Vec<T>, StoreError> {
    sort_items(&mut items, &page.sort_orders).map_err(invalid_query)?;
    Ok(window(items, page))
}

/// In-memory relational store shared by the event and subscriber repositories.
///
/// Intended for tests/dev. Mirrors the Postgres schema: subscribers reference
/// events by id, deleting an event deletes its subscribers, and attendee
/// counts are computed on every read.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(self: &Arc<Self>) -> InMemoryEventRepository {
        InMemoryEventRepository { db: Arc::clone(self) }
    }

    pub fn subscribers(self: &Arc<Self>) -> InMemorySubscriberRepository {
        InMemorySubscriberRepository { db: Arc::clone(self) }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryEventRepository {
    db: Arc<InMemoryDatabase>,
}

#[async_trait::async_trait]
impl Repository<Event> for InMemoryEventRepository {
    async fn find_page(&self, page: &PageRequest) -> Result<Vec<Event>, StoreError> {
        let items = self.find_all().await?;
        sorted_page(items, page)
    }

    async fn find_all(&self) -> Result<Vec<Event>, StoreError> {
        let tables = self.db.read()?;
        Ok(tables.events.values().map(|e| tables.load_event(e)).collect())
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let tables = self.db.read()?;
        Ok(tables.events.get(&id).map(|e| tables.load_event(e)))
    }

    async fn save(&self, mut event: Event) -> Result<Event, StoreError> {
        let mut tables = self.db.write()?;

        let id = match event.id {
            None => {
                tables.last_event_id += 1;
                let id = EventId::new(tables.last_event_id);
                event.set_identity(id, 0);
                id
            }
            Some(id) => {
                let stored = tables
                    .events
                    .get(&id)
                    .ok_or_else(|| StoreError::not_found(Event::KIND, id))?;
                check_version(Event::KIND, id, stored.version, event.version)?;
                event.set_identity(id, stored.version + 1);
                id
            }
        };

        event.nb_attendees = 0;
        tables.events.insert(id, event);
        Ok(tables.load_event(&tables.events[&id]))
    }

    async fn delete_by_id(&self, id: EventId) -> Result<(), StoreError> {
        let mut tables = self.db.write()?;
        tables
            .events
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(Event::KIND, id))?;
        tables.subscribers.retain(|_, row| row.event_id != id);
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.db.read()?.events.len() as u64)
    }
}

#[derive(Debug, Clone)]
pub struct InMemorySubscriberRepository {
    db: Arc<InMemoryDatabase>,
}

#[async_trait::async_trait]
impl Repository<Subscriber> for InMemorySubscriberRepository {
    async fn find_page(&self, page: &PageRequest) -> Result<Vec<Subscriber>, StoreError> {
        let items = self.find_all().await?;
        sorted_page(items, page)
    }

    async fn find_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        let tables = self.db.read()?;
        tables
            .subscribers
            .values()
            .map(|row| tables.load_subscriber(row))
            .collect()
    }

    async fn find_by_id(&self, id: SubscriberId) -> Result<Option<Subscriber>, StoreError> {
        let tables = self.db.read()?;
        tables
            .subscribers
            .get(&id)
            .map(|row| tables.load_subscriber(row))
            .transpose()
    }

    async fn save(&self, mut subscriber: Subscriber) -> Result<Subscriber, StoreError> {
        let event_id = subscriber
            .event_id()
            .ok_or_else(|| StoreError::MissingReference("subscriber has no event id".to_string()))?;

        let mut tables = self.db.write()?;
        if !tables.events.contains_key(&event_id) {
            return Err(StoreError::MissingReference(format!("event {event_id}")));
        }

        let id = match subscriber.id {
            None => {
                tables.last_subscriber_id += 1;
                let id = SubscriberId::new(tables.last_subscriber_id);
                subscriber.set_identity(id, 0);
                id
            }
            Some(id) => {
                let stored = tables
                    .subscribers
                    .get(&id)
                    .ok_or_else(|| StoreError::not_found(Subscriber::KIND, id))?;
                check_version(Subscriber::KIND, id, stored.subscriber.version, subscriber.version)?;
                subscriber.set_identity(id, stored.subscriber.version + 1);
                id
            }
        };

        // Only the key is stored; the nested event is never written.
        subscriber.event = None;
        tables.subscribers.insert(id, SubscriberRow { subscriber, event_id });
        tables.load_subscriber(&tables.subscribers[&id])
    }

    async fn delete_by_id(&self, id: SubscriberId) -> Result<(), StoreError> {
        self.db
            .write()?
            .subscribers
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(Subscriber::KIND, id))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.db.read()?.subscribers.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventhub_core::SortOrder;

    fn setup() -> (InMemoryEventRepository, InMemorySubscriberRepository) {
        let db = InMemoryDatabase::new();
        (db.events(), db.subscribers())
    }

    fn named(name: &str) -> Event {
        Event::new(name)
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_version_zero() {
        let (events, _) = setup();

        let a = events.save(named("A")).await.unwrap();
        let b = events.save(named("B")).await.unwrap();

        assert_eq!(a.id, Some(EventId::new(1)));
        assert_eq!(b.id, Some(EventId::new(2)));
        assert_eq!(a.version, 0);
        assert_eq!(events.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn replace_bumps_version_by_one() {
        let (events, _) = setup();
        let mut event = events.save(named("A")).await.unwrap();

        event.name = "A2".to_string();
        let saved = events.save(event).await.unwrap();

        assert_eq!(saved.version, 1);
        let stored = events.find_by_id(EventId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.name, "A2");
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn stale_version_is_rejected_without_writing() {
        let (events, _) = setup();
        let original = events.save(named("A")).await.unwrap();

        let mut first = original.clone();
        first.name = "first".to_string();
        events.save(first).await.unwrap();

        let mut second = original;
        second.name = "second".to_string();
        let err = events.save(second).await.unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        let stored = events.find_by_id(EventId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.name, "first");
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn replace_of_unknown_id_is_not_found() {
        let (events, _) = setup();
        let err = events.save(Event::reference(EventId::new(9))).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "event", .. }));
    }

    #[tokio::test]
    async fn delete_missing_id_is_not_found() {
        let (events, subscribers) = setup();
        assert!(matches!(
            events.delete_by_id(EventId::new(1)).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            subscribers.delete_by_id(SubscriberId::new(1)).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn attendee_count_is_computed_on_read() {
        let (events, subscribers) = setup();
        let event = events.save(named("Conf")).await.unwrap();
        let id = event.id.unwrap();

        for last in ["Lee", "Kim", "Roe"] {
            let s = Subscriber::new("Ann", last, "ann@x.com", Event::reference(id));
            subscribers.save(s).await.unwrap();
        }

        let loaded = events.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.nb_attendees, 3);
        let listed = events.find_all().await.unwrap();
        assert_eq!(listed[0].nb_attendees, 3);
    }

    #[tokio::test]
    async fn subscriber_save_never_writes_the_nested_event() {
        let (events, subscribers) = setup();
        let event = events.save(named("Conf")).await.unwrap();

        let mut forged = Event::reference(event.id.unwrap());
        forged.name = "Hijacked".to_string();
        forged.version = 41;
        let saved = subscribers
            .save(Subscriber::new("Ann", "Lee", "ann@x.com", forged))
            .await
            .unwrap();

        let stored_event = events.find_by_id(event.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored_event.name, "Conf");
        assert_eq!(stored_event.version, 0);
        assert_eq!(saved.event.unwrap().name, "Conf");
    }

    #[tokio::test]
    async fn subscriber_with_unknown_event_is_rejected() {
        let (_, subscribers) = setup();
        let s = Subscriber::new("Ann", "Lee", "ann@x.com", Event::reference(EventId::new(5)));
        assert!(matches!(
            subscribers.save(s).await,
            Err(StoreError::MissingReference(_))
        ));
        assert_eq!(subscribers.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_an_event_deletes_its_subscribers() {
        let (events, subscribers) = setup();
        let keep = events.save(named("Keep")).await.unwrap().id.unwrap();
        let doomed = events.save(named("Drop")).await.unwrap().id.unwrap();

        subscribers
            .save(Subscriber::new("Ann", "Lee", "ann@x.com", Event::reference(keep)))
            .await
            .unwrap();
        subscribers
            .save(Subscriber::new("Bob", "Ray", "bob@x.com", Event::reference(doomed)))
            .await
            .unwrap();

        events.delete_by_id(doomed).await.unwrap();

        let remaining = subscribers.find_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].event_id(), Some(keep));
    }

    #[tokio::test]
    async fn pages_are_sorted_then_windowed() {
        let (events, _) = setup();
        for name in ["delta", "alpha", "charlie", "bravo"] {
            events.save(named(name)).await.unwrap();
        }

        let page = PageRequest::new(1, 2, vec![SortOrder::asc("name")]).unwrap();
        let names: Vec<String> = events
            .find_page(&page)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["bravo", "charlie"]);
    }

    #[tokio::test]
    async fn unknown_sort_property_is_an_invalid_query() {
        let (events, _) = setup();
        let page = PageRequest::new(0, 10, vec![SortOrder::asc("nbAttendees")]).unwrap();
        assert!(matches!(
            events.find_page(&page).await,
            Err(StoreError::InvalidQuery(_))
        ));
    }
}
