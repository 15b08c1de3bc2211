//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (foreign key violation) | `23503` | `MissingReference` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Io / other | N/A | `Backend` |
//!
//! ## Optimistic Concurrency
//!
//! Replaces are a single conditional `UPDATE ... WHERE id = $1 AND version = $2`.
//! When no row matches, a lookup on `id` tells `NotFound` apart from
//! `Concurrency`.
//!
//! ## Attendee Count
//!
//! `nb_attendees` is a sub-select over `subscriber`, evaluated on every read.

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use eventhub_core::{Entity, EventId, PageRequest, SortDirection, SortOrder, SubscriberId, Version};
use eventhub_events::Event;
use eventhub_subscribers::Subscriber;

use super::{Repository, StoreError};

/// Schema applied by [`apply_schema`].
pub const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Open a connection pool and make sure the schema exists.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;
    apply_schema(&pool).await?;
    Ok(pool)
}

/// Create tables and indexes if they do not exist yet.
pub async fn apply_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_schema", e))?;
    Ok(())
}

const SELECT_EVENTS: &str = r#"
    SELECT
        e.id,
        e.version,
        e.name,
        e.description,
        e.event_date,
        e.location,
        e.max_attendees,
        (SELECT COUNT(*) FROM subscriber a WHERE a.event_id = e.id) AS nb_attendees
    FROM event e
"#;

const SELECT_SUBSCRIBERS: &str = r#"
    SELECT
        s.id,
        s.version,
        s.first_name,
        s.last_name,
        s.email,
        e.id AS event_id,
        e.version AS event_version,
        e.name AS event_name,
        e.description AS event_description,
        e.event_date AS event_event_date,
        e.location AS event_location,
        e.max_attendees AS event_max_attendees,
        (SELECT COUNT(*) FROM subscriber a WHERE a.event_id = e.id) AS event_nb_attendees
    FROM subscriber s
    JOIN event e ON e.id = s.event_id
"#;

// Text columns sort bytewise, matching the in-memory store.
fn event_column(path: &str) -> Option<&'static str> {
    match path {
        "id" => Some("e.id"),
        "name" => Some(r#"e.name COLLATE "C""#),
        "description" => Some(r#"e.description COLLATE "C""#),
        "eventDate" => Some("e.event_date"),
        "location" => Some(r#"e.location COLLATE "C""#),
        "maxAttendees" => Some("e.max_attendees"),
        _ => None,
    }
}

fn subscriber_column(path: &str) -> Option<&'static str> {
    match path {
        "id" => Some("s.id"),
        "firstName" => Some(r#"s.first_name COLLATE "C""#),
        "lastName" => Some(r#"s.last_name COLLATE "C""#),
        "email" => Some(r#"s.email COLLATE "C""#),
        _ => None,
    }
}

/// Append `ORDER BY` (whitelisted columns only, id tie-break) and the window.
fn push_page(
    qb: &mut QueryBuilder<'_, Postgres>,
    page: &PageRequest,
    column: fn(&str) -> Option<&'static str>,
    id_column: &'static str,
) -> Result<(), StoreError> {
    qb.push(" ORDER BY ");
    for SortOrder { path, direction } in &page.sort_orders {
        let col = column(path).ok_or_else(|| {
            StoreError::InvalidQuery(format!("cannot sort by unknown property '{path}'"))
        })?;
        qb.push(col);
        qb.push(match direction {
            SortDirection::Asc => " ASC NULLS FIRST, ",
            SortDirection::Desc => " DESC NULLS LAST, ",
        });
    }
    qb.push(id_column);
    qb.push(" ASC LIMIT ");
    qb.push_bind(to_db_int(page.limit)?);
    qb.push(" OFFSET ");
    qb.push_bind(to_db_int(page.offset)?);
    Ok(())
}

fn to_db_int(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidQuery(format!("{value} is out of range")))
}

fn from_db_int(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Backend(format!("negative counter {value} in storage")))
}

fn event_from_row(row: &PgRow, prefix: &str) -> Result<Event, StoreError> {
    let col = |name: &str| format!("{prefix}{name}");
    let get = |e: sqlx::Error| map_sqlx_error("decode_event", e);

    Ok(Event {
        id: Some(EventId::new(row.try_get(col("id").as_str()).map_err(get)?)),
        version: from_db_int(row.try_get(col("version").as_str()).map_err(get)?)?,
        name: row.try_get(col("name").as_str()).map_err(get)?,
        description: row.try_get(col("description").as_str()).map_err(get)?,
        event_date: row.try_get(col("event_date").as_str()).map_err(get)?,
        location: row.try_get(col("location").as_str()).map_err(get)?,
        max_attendees: row.try_get(col("max_attendees").as_str()).map_err(get)?,
        nb_attendees: from_db_int(row.try_get(col("nb_attendees").as_str()).map_err(get)?)?,
    })
}

fn subscriber_from_row(row: &PgRow) -> Result<Subscriber, StoreError> {
    let get = |e: sqlx::Error| map_sqlx_error("decode_subscriber", e);

    Ok(Subscriber {
        id: Some(SubscriberId::new(row.try_get("id").map_err(get)?)),
        version: from_db_int(row.try_get("version").map_err(get)?)?,
        first_name: row.try_get("first_name").map_err(get)?,
        last_name: row.try_get("last_name").map_err(get)?,
        email: row.try_get("email").map_err(get)?,
        event: Some(event_from_row(row, "event_")?),
    })
}

/// Resolve a failed conditional update into `NotFound` or `Concurrency`.
async fn stale_write_error(
    pool: &PgPool,
    table: &'static str,
    kind: &'static str,
    id: i64,
    given: Version,
) -> StoreError {
    let current = QueryBuilder::<Postgres>::new(format!("SELECT version FROM {table} WHERE id = "))
        .push_bind(id)
        .build()
        .fetch_optional(pool)
        .await;

    match current {
        Ok(None) => StoreError::not_found(kind, id),
        Ok(Some(row)) => match row.try_get::<i64, _>("version") {
            Ok(found) => StoreError::Concurrency(format!(
                "{kind} {id}: expected version {given}, found {found}"
            )),
            Err(e) => map_sqlx_error("read_version", e),
        },
        Err(e) => map_sqlx_error("read_version", e),
    }
}

/// Postgres-backed event repository.
#[derive(Debug, Clone)]
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Repository<Event> for PostgresEventRepository {
    #[instrument(skip(self), err)]
    async fn find_page(&self, page: &PageRequest) -> Result<Vec<Event>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_EVENTS);
        push_page(&mut qb, page, event_column, "e.id")?;

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_page", e))?;
        rows.iter().map(|r| event_from_row(r, "")).collect()
    }

    #[instrument(skip(self), err)]
    async fn find_all(&self) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_EVENTS} ORDER BY e.id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_all", e))?;
        rows.iter().map(|r| event_from_row(r, "")).collect()
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_EVENTS} WHERE e.id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;
        row.as_ref().map(|r| event_from_row(r, "")).transpose()
    }

    #[instrument(skip(self, event), fields(event_id = ?event.id), err)]
    async fn save(&self, event: Event) -> Result<Event, StoreError> {
        let id = match event.id {
            None => {
                let row = sqlx::query(
                    r#"
                    INSERT INTO event (version, name, description, event_date, location, max_attendees)
                    VALUES (0, $1, $2, $3, $4, $5)
                    RETURNING id
                    "#,
                )
                .bind(&event.name)
                .bind(&event.description)
                .bind(event.event_date)
                .bind(&event.location)
                .bind(event.max_attendees)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("insert_event", e))?;
                EventId::new(row.try_get("id").map_err(|e| map_sqlx_error("insert_event", e))?)
            }
            Some(id) => {
                let updated = sqlx::query(
                    r#"
                    UPDATE event
                    SET version = version + 1,
                        name = $3,
                        description = $4,
                        event_date = $5,
                        location = $6,
                        max_attendees = $7
                    WHERE id = $1 AND version = $2
                    "#,
                )
                .bind(id.get())
                .bind(to_db_int(event.version)?)
                .bind(&event.name)
                .bind(&event.description)
                .bind(event.event_date)
                .bind(&event.location)
                .bind(event.max_attendees)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_event", e))?;

                if updated.rows_affected() == 0 {
                    return Err(
                        stale_write_error(&self.pool, "event", Event::KIND, id.get(), event.version).await,
                    );
                }
                id
            }
        };

        self.find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found(Event::KIND, id))
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn delete_by_id(&self, id: EventId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM event WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found(Event::KIND, id));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM event")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_events", e))?;
        from_db_int(row.try_get("n").map_err(|e| map_sqlx_error("count_events", e))?)
    }
}

/// Postgres-backed subscriber repository.
///
/// Writes only `event_id`; the nested event is read back through a join.
#[derive(Debug, Clone)]
pub struct PostgresSubscriberRepository {
    pool: PgPool,
}

impl PostgresSubscriberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Repository<Subscriber> for PostgresSubscriberRepository {
    #[instrument(skip(self), err)]
    async fn find_page(&self, page: &PageRequest) -> Result<Vec<Subscriber>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_SUBSCRIBERS);
        push_page(&mut qb, page, subscriber_column, "s.id")?;

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_page", e))?;
        rows.iter().map(subscriber_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn find_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_SUBSCRIBERS} ORDER BY s.id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_all", e))?;
        rows.iter().map(subscriber_from_row).collect()
    }

    #[instrument(skip(self), fields(subscriber_id = %id), err)]
    async fn find_by_id(&self, id: SubscriberId) -> Result<Option<Subscriber>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_SUBSCRIBERS} WHERE s.id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;
        row.as_ref().map(subscriber_from_row).transpose()
    }

    #[instrument(skip(self, subscriber), fields(subscriber_id = ?subscriber.id), err)]
    async fn save(&self, subscriber: Subscriber) -> Result<Subscriber, StoreError> {
        let event_id = subscriber
            .event_id()
            .ok_or_else(|| StoreError::MissingReference("subscriber has no event id".to_string()))?;

        let id = match subscriber.id {
            None => {
                let row = sqlx::query(
                    r#"
                    INSERT INTO subscriber (version, first_name, last_name, email, event_id)
                    VALUES (0, $1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(&subscriber.first_name)
                .bind(&subscriber.last_name)
                .bind(&subscriber.email)
                .bind(event_id.get())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("insert_subscriber", e))?;
                SubscriberId::new(
                    row.try_get("id")
                        .map_err(|e| map_sqlx_error("insert_subscriber", e))?,
                )
            }
            Some(id) => {
                let updated = sqlx::query(
                    r#"
                    UPDATE subscriber
                    SET version = version + 1,
                        first_name = $3,
                        last_name = $4,
                        email = $5,
                        event_id = $6
                    WHERE id = $1 AND version = $2
                    "#,
                )
                .bind(id.get())
                .bind(to_db_int(subscriber.version)?)
                .bind(&subscriber.first_name)
                .bind(&subscriber.last_name)
                .bind(&subscriber.email)
                .bind(event_id.get())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_subscriber", e))?;

                if updated.rows_affected() == 0 {
                    return Err(stale_write_error(
                        &self.pool,
                        "subscriber",
                        Subscriber::KIND,
                        id.get(),
                        subscriber.version,
                    )
                    .await);
                }
                id
            }
        };

        self.find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found(Subscriber::KIND, id))
    }

    #[instrument(skip(self), fields(subscriber_id = %id), err)]
    async fn delete_by_id(&self, id: SubscriberId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM subscriber WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_subscriber", e))?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found(Subscriber::KIND, id));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM subscriber")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_subscribers", e))?;
        from_db_int(row.try_get("n").map_err(|e| map_sqlx_error("count_subscribers", e))?)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Foreign key violation
                Some("23503") => StoreError::MissingReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
