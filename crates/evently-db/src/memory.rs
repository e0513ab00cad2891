//! In-memory event store for local runs and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use evently_models::{
    CreateEventDto, CreateLinkDto, DEFAULT_CREATED_BY, DEFAULT_LOCATION, DEFAULT_SEGMENT, Event,
    EventFilterParams, Link, UpdateEventDto,
};
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::EventStore;

#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    events: Arc<RwLock<HashMap<Uuid, Event>>>,
    links: Arc<RwLock<Vec<Link>>>,
    next_link_id: Arc<AtomicI64>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a stored event without going through the write path.
    ///
    /// Lets tests change data behind the cache's back.
    pub async fn overwrite(&self, event: Event) {
        self.events.write().await.insert(event.id, event);
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    #[instrument(skip(self, dto), fields(db.operation = "INSERT", event.name = %dto.name))]
    async fn create(&self, dto: CreateEventDto) -> Result<Event, StoreError> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            name: dto.name,
            description: dto.description,
            start_date: dto.start_date,
            end_date: dto.end_date,
            created_at: now,
            updated_at: now,
            created_by: dto.created_by.unwrap_or_else(|| DEFAULT_CREATED_BY.into()),
            segment: dto.segment.unwrap_or_else(|| DEFAULT_SEGMENT.into()),
            location: dto.location.unwrap_or_else(|| DEFAULT_LOCATION.into()),
        };

        self.events.write().await.insert(event.id, event.clone());
        Ok(event)
    }

    #[instrument(skip(self), fields(db.operation = "SELECT"))]
    async fn get(&self, id: Uuid) -> Result<Event, StoreError> {
        self.events
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    #[instrument(skip(self), fields(db.operation = "SELECT"))]
    async fn get_by_name(&self, name: &str) -> Result<Event, StoreError> {
        let events = self.events.read().await;
        let mut matches = events.values().filter(|e| e.name == name);

        match (matches.next(), matches.next()) {
            (None, _) => Err(StoreError::name_not_found(name)),
            (Some(event), None) => Ok(event.clone()),
            (Some(_), Some(_)) => Err(StoreError::ambiguous_name(name)),
        }
    }

    #[instrument(skip(self), fields(db.operation = "SELECT"))]
    async fn list(&self, filters: &EventFilterParams) -> Result<Vec<Event>, StoreError> {
        let mut events: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| filters.matches(e))
            .cloned()
            .collect();

        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    #[instrument(skip(self, changes), fields(db.operation = "UPDATE"))]
    async fn update(&self, id: Uuid, changes: UpdateEventDto) -> Result<Event, StoreError> {
        let mut events = self.events.write().await;
        let event = events.get_mut(&id).ok_or_else(|| StoreError::not_found(id))?;

        changes.apply_to(event);
        event.updated_at = Utc::now();

        Ok(event.clone())
    }

    #[instrument(skip(self), fields(db.operation = "DELETE"))]
    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.events
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(id))?;

        self.links.write().await.retain(|l| l.event_id != id);
        Ok(())
    }

    #[instrument(skip(self, dto), fields(db.operation = "INSERT"))]
    async fn add_link(&self, event_id: Uuid, dto: CreateLinkDto) -> Result<Link, StoreError> {
        // Held across the insert so a concurrent delete cannot orphan the link.
        let events = self.events.read().await;
        if !events.contains_key(&event_id) {
            return Err(StoreError::not_found(event_id));
        }

        let link = Link {
            id: self.next_link_id.fetch_add(1, Ordering::Relaxed) + 1,
            kind: dto.kind,
            link: dto.link,
            event_id,
        };
        self.links.write().await.push(link.clone());
        Ok(link)
    }

    #[instrument(skip(self), fields(db.operation = "SELECT"))]
    async fn links_for(&self, event_id: Uuid) -> Result<Vec<Link>, StoreError> {
        Ok(self
            .links
            .read()
            .await
            .iter()
            .filter(|l| l.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dto(name: &str) -> CreateEventDto {
        CreateEventDto {
            name: name.to_string(),
            description: "Talks and workshops".to_string(),
            start_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            created_by: None,
            segment: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let store = MemoryEventStore::new();
        let event = store.create(dto("Conf")).await.unwrap();

        assert_eq!(event.created_by, DEFAULT_CREATED_BY);
        assert_eq!(event.segment, DEFAULT_SEGMENT);
        assert_eq!(event.location, DEFAULT_LOCATION);
        assert_eq!(store.get(event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let store = MemoryEventStore::new();
        let event = store.create(dto("Conf")).await.unwrap();

        let updated = store
            .update(
                event.id,
                UpdateEventDto {
                    description: Some("Workshops only".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Conf");
        assert_eq!(updated.description, "Workshops only");
        assert!(updated.updated_at >= event.updated_at);
    }

    #[tokio::test]
    async fn test_missing_ids() {
        let store = MemoryEventStore::new();
        let id = Uuid::new_v4();

        assert!(matches!(store.get(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update(id, UpdateEventDto::default()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryEventStore::new();
        let event = store.create(dto("Conf")).await.unwrap();

        store.delete(event.id).await.unwrap();
        assert!(store.list(&EventFilterParams::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = MemoryEventStore::new();
        store.create(dto("RustConf")).await.unwrap();
        store
            .create(CreateEventDto {
                location: Some("Lisboa".into()),
                ..dto("GoDay")
            })
            .await
            .unwrap();

        let rust = EventFilterParams {
            name: Some("RUST".into()),
            ..Default::default()
        };
        let lisboa = EventFilterParams {
            location: Some("Lisboa".into()),
            ..Default::default()
        };

        assert_eq!(store.list(&rust).await.unwrap()[0].name, "RustConf");
        assert_eq!(store.list(&lisboa).await.unwrap()[0].name, "GoDay");
        assert_eq!(store.list(&EventFilterParams::default()).await.unwrap().len(), 2);
    }

    fn instagram() -> CreateLinkDto {
        CreateLinkDto {
            kind: evently_models::SocialNet::Instagram,
            link: "https://instagram.com/conf".into(),
        }
    }

    #[tokio::test]
    async fn test_links_follow_their_event() {
        let store = MemoryEventStore::new();
        let conf = store.create(dto("Conf")).await.unwrap();
        let other = store.create(dto("Meetup")).await.unwrap();

        let first = store.add_link(conf.id, instagram()).await.unwrap();
        let second = store.add_link(conf.id, instagram()).await.unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.links_for(conf.id).await.unwrap(), vec![first, second]);
        assert!(store.links_for(other.id).await.unwrap().is_empty());

        store.delete(conf.id).await.unwrap();
        assert!(store.links_for(conf.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_link_to_missing_event() {
        let store = MemoryEventStore::new();
        assert!(matches!(
            store.add_link(Uuid::new_v4(), instagram()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_name() {
        let store = MemoryEventStore::new();
        store.create(dto("Conf")).await.unwrap();
        assert_eq!(store.get_by_name("Conf").await.unwrap().name, "Conf");

        store.create(dto("Conf")).await.unwrap();
        assert!(matches!(
            store.get_by_name("Conf").await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.get_by_name("Nope").await,
            Err(StoreError::NotFound(_))
        ));
    }
}
