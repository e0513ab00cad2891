//! The event storage contract.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use evently_models::{CreateEventDto, CreateLinkDto, Event, EventFilterParams, Link, UpdateEventDto};
use uuid::Uuid;

use crate::error::StoreError;

/// Authoritative storage for events.
///
/// Lists are ordered newest first.
#[async_trait]
pub trait EventStore: Send + Sync + Debug {
    async fn create(&self, dto: CreateEventDto) -> Result<Event, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Event, StoreError>;

    /// Looks an event up by its exact name.
    ///
    /// Fails with [`StoreError::Conflict`] when the name is not unique.
    async fn get_by_name(&self, name: &str) -> Result<Event, StoreError>;

    async fn list(&self, filters: &EventFilterParams) -> Result<Vec<Event>, StoreError>;

    async fn update(&self, id: Uuid, changes: UpdateEventDto) -> Result<Event, StoreError>;

    /// Deletes the event together with its links.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Attaches a link to an existing event.
    async fn add_link(&self, event_id: Uuid, dto: CreateLinkDto) -> Result<Link, StoreError>;

    /// Links of an event in insertion order. Unknown events have none.
    async fn links_for(&self, event_id: Uuid) -> Result<Vec<Link>, StoreError>;
}

pub type SharedStore = Arc<dyn EventStore>;
