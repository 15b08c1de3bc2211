//! Persistence gateway: per-entity storage access.
//!
//! A [`Repository`] stores one entity type keyed by its integer identifier.
//! Storage assigns identifiers and versions; every replace is guarded by the
//! version the caller read.

use std::sync::Arc;

use thiserror::Error;

use eventhub_core::{Entity, PageRequest};
use eventhub_events::Event;
use eventhub_subscribers::Subscriber;

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryDatabase, InMemoryEventRepository, InMemorySubscriberRepository};
pub use postgres::{PostgresEventRepository, PostgresSubscriberRepository};

/// Storage operation error.
///
/// These are **infrastructure errors** (missing rows, stale versions, backend
/// failures) as opposed to domain validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// The query could not be expressed (e.g. unknown sort property).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A referenced row does not exist (foreign key).
    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Storage contract for one entity type.
///
/// - `save` with no id inserts and assigns id + version `0`.
/// - `save` with an id replaces the stored row only if its version equals the
///   entity's version, bumping it by one; otherwise `Concurrency`
///   (`NotFound` if the row is gone).
/// - `delete_by_id` of a missing id is `NotFound`.
/// - Reads are ordered by the page's sort orders, then ascending id.
#[async_trait::async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn find_page(&self, page: &PageRequest) -> Result<Vec<T>, StoreError>;

    async fn find_all(&self) -> Result<Vec<T>, StoreError>;

    async fn find_by_id(&self, id: T::Id) -> Result<Option<T>, StoreError>;

    async fn save(&self, entity: T) -> Result<T, StoreError>;

    async fn delete_by_id(&self, id: T::Id) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// The set of repositories one storage backend provides.
#[derive(Clone)]
pub struct Repositories {
    pub events: Arc<dyn Repository<Event>>,
    pub subscribers: Arc<dyn Repository<Subscriber>>,
}

impl Repositories {
    /// Fresh, empty in-memory storage.
    pub fn in_memory() -> Self {
        let db = InMemoryDatabase::new();
        Self {
            events: Arc::new(db.events()),
            subscribers: Arc::new(db.subscribers()),
        }
    }

    /// PostgreSQL storage over an existing pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            events: Arc::new(PostgresEventRepository::new(pool.clone())),
            subscribers: Arc::new(PostgresSubscriberRepository::new(pool)),
        }
    }
}
