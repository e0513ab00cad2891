//! PostgreSQL event store.

use async_trait::async_trait;
use evently_models::{
    CreateEventDto, CreateLinkDto, DEFAULT_CREATED_BY, DEFAULT_LOCATION, DEFAULT_SEGMENT, Event,
    EventFilterParams, Link, UpdateEventDto,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{StoreError, classify};
use crate::store::EventStore;

const EVENT_COLUMNS: &str = "id, name, description, start_date, end_date, created_at, updated_at, \
     created_by, segment, location";

const LINK_COLUMNS: &str = "id, type, link, event_id";

/// `ILIKE` pattern matching `needle` literally anywhere in the value.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Clone)]
pub struct PgEventStore {
    db: PgPool,
}

impl PgEventStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(skip(self, dto), fields(db.operation = "INSERT", event.name = %dto.name))]
    async fn create(&self, dto: CreateEventDto) -> Result<Event, StoreError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"INSERT INTO events (id, name, description, start_date, end_date, created_by, segment, location)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {EVENT_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(&dto.name)
        .bind(&dto.description)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(dto.created_by.as_deref().unwrap_or(DEFAULT_CREATED_BY))
        .bind(dto.segment.as_deref().unwrap_or(DEFAULT_SEGMENT))
        .bind(dto.location.as_deref().unwrap_or(DEFAULT_LOCATION))
        .fetch_one(&self.db)
        .await
        .map_err(classify)?;

        Ok(event)
    }

    #[instrument(skip(self), fields(db.operation = "SELECT"))]
    async fn get(&self, id: Uuid) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| StoreError::not_found(id))
    }

    #[instrument(skip(self), fields(db.operation = "SELECT"))]
    async fn get_by_name(&self, name: &str) -> Result<Event, StoreError> {
        let mut matches = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE name = $1 LIMIT 2"
        ))
        .bind(name)
        .fetch_all(&self.db)
        .await?;

        match matches.len() {
            0 => Err(StoreError::name_not_found(name)),
            1 => Ok(matches.remove(0)),
            _ => Err(StoreError::ambiguous_name(name)),
        }
    }

    #[instrument(skip(self), fields(db.operation = "SELECT"))]
    async fn list(&self, filters: &EventFilterParams) -> Result<Vec<Event>, StoreError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE TRUE"));

        if let Some(name) = &filters.name {
            query
                .push(" AND name ILIKE ")
                .push_bind(contains_pattern(name))
                .push(r" ESCAPE '\'");
        }
        if let Some(location) = &filters.location {
            query.push(" AND location = ").push_bind(location);
        }
        if let Some(segment) = &filters.segment {
            query.push(" AND segment = ").push_bind(segment);
        }
        if let Some(created_by) = &filters.created_by {
            query.push(" AND created_by = ").push_bind(created_by);
        }
        query.push(" ORDER BY created_at DESC, id");

        let events = query.build_query_as::<Event>().fetch_all(&self.db).await?;

        Ok(events)
    }

    #[instrument(skip(self, changes), fields(db.operation = "UPDATE"))]
    async fn update(&self, id: Uuid, changes: UpdateEventDto) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>(&format!(
            r#"UPDATE events SET
                   name = COALESCE($2, name),
                   description = COALESCE($3, description),
                   start_date = COALESCE($4, start_date),
                   end_date = COALESCE($5, end_date),
                   created_by = COALESCE($6, created_by),
                   segment = COALESCE($7, segment),
                   location = COALESCE($8, location),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {EVENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.created_by)
        .bind(changes.segment)
        .bind(changes.location)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?
        .ok_or_else(|| StoreError::not_found(id))
    }

    #[instrument(skip(self), fields(db.operation = "DELETE"))]
    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self, dto), fields(db.operation = "INSERT"))]
    async fn add_link(&self, event_id: Uuid, dto: CreateLinkDto) -> Result<Link, StoreError> {
        sqlx::query_as::<_, Link>(&format!(
            r#"INSERT INTO links (type, link, event_id)
               SELECT $1, $2, id FROM events WHERE id = $3
               RETURNING {LINK_COLUMNS}"#
        ))
        .bind(dto.kind)
        .bind(dto.link)
        .bind(event_id)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?
        .ok_or_else(|| StoreError::not_found(event_id))
    }

    #[instrument(skip(self), fields(db.operation = "SELECT"))]
    async fn links_for(&self, event_id: Uuid) -> Result<Vec<Link>, StoreError> {
        let links = sqlx::query_as::<_, Link>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE event_id = $1 ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(&self.db)
        .await?;

        Ok(links)
    }
}
