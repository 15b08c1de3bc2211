//! Service wiring: storage backend selection and the services built on it.

use std::sync::Arc;

use tracing::info;

use eventhub_auth::{Hs256TokenIssuer, UserDirectory};
use eventhub_infra::config::{AppConfig, StorageConfig};
use eventhub_infra::repository::{Repositories, StoreError, postgres};
use eventhub_infra::services::{EventService, SubscriberService};

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub events: Arc<EventService>,
    pub subscribers: SubscriberService,
    pub users: UserDirectory,
    pub tokens: Hs256TokenIssuer,
}

impl AppServices {
    pub fn new(repositories: Repositories, users: UserDirectory, tokens: Hs256TokenIssuer) -> Self {
        let events = Arc::new(EventService::new(repositories.events));
        let subscribers = SubscriberService::new(repositories.subscribers, events.clone());
        Self {
            events,
            subscribers,
            users,
            tokens,
        }
    }

    /// Build services over the configured storage backend.
    ///
    /// Postgres pools are opened and the schema applied before returning.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let repositories = match &config.storage {
            StorageConfig::InMemory => {
                info!("using in-memory storage");
                Repositories::in_memory()
            }
            StorageConfig::Postgres { url, max_connections } => {
                let pool = postgres::connect(url, *max_connections).await?;
                info!(max_connections, "connected to postgres");
                Repositories::postgres(pool)
            }
        };

        Ok(Self::new(
            repositories,
            config.users.clone(),
            Hs256TokenIssuer::new(&config.jwt_secret, config.token_ttl),
        ))
    }
}
