//! Event domain models and DTOs.
//!
//! This module contains the event entity, the create/update request bodies,
//! and the filter parameters accepted by the list endpoint.

use chrono::{DateTime, Utc};
use evently_cache::{CacheModel, Invalidatable};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_CREATED_BY: &str = "gusdev";
pub const DEFAULT_SEGMENT: &str = "Software Development";
pub const DEFAULT_LOCATION: &str = "Brasil";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub segment: String,
    pub location: String,
}

impl CacheModel for Event {
    const MODEL_NAME: &'static str = "event";

    fn cache_id(&self) -> String {
        self.id.to_string()
    }
}

impl Invalidatable for Event {}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEventDto {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 320))]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Defaults to `gusdev`
    #[validate(length(max = 100))]
    pub created_by: Option<String>,
    /// Defaults to `Software Development`
    #[validate(length(max = 100))]
    pub segment: Option<String>,
    /// Defaults to `Brasil`
    #[validate(length(max = 200))]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEventDto {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 320))]
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(length(max = 100))]
    pub created_by: Option<String>,
    #[validate(length(max = 100))]
    pub segment: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
}

impl UpdateEventDto {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.created_by.is_none()
            && self.segment.is_none()
            && self.location.is_none()
    }

    /// Applies the present fields to `event`.
    pub fn apply_to(self, event: &mut Event) {
        if let Some(name) = self.name {
            event.name = name;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(start_date) = self.start_date {
            event.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            event.end_date = end_date;
        }
        if let Some(created_by) = self.created_by {
            event.created_by = created_by;
        }
        if let Some(segment) = self.segment {
            event.segment = segment;
        }
        if let Some(location) = self.location {
            event.location = location;
        }
    }
}

/// A full replacement (PUT) sets every required field; optional fields left
/// out keep their stored value.
impl From<CreateEventDto> for UpdateEventDto {
    fn from(dto: CreateEventDto) -> Self {
        Self {
            name: Some(dto.name),
            description: Some(dto.description),
            start_date: Some(dto.start_date),
            end_date: Some(dto.end_date),
            created_by: dto.created_by,
            segment: dto.segment,
            location: dto.location,
        }
    }
}

/// Filters understood by the event list.
///
/// Any other query parameter is ignored by the store.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventFilterParams {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    pub location: Option<String>,
    pub segment: Option<String>,
    pub created_by: Option<String>,
}

impl EventFilterParams {
    /// Builds filters from raw query pairs.
    ///
    /// A repeated parameter keeps its last value; unknown ones are skipped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "name" => &mut filters.name,
                "location" => &mut filters.location,
                "segment" => &mut filters.segment,
                "created_by" => &mut filters.created_by,
                _ => continue,
            };
            *slot = Some(value.as_ref().to_string());
        }
        filters
    }

    /// Whether `event` passes every present filter.
    pub fn matches(&self, event: &Event) -> bool {
        let name_ok = self
            .name
            .as_ref()
            .is_none_or(|n| event.name.to_lowercase().contains(&n.to_lowercase()));

        name_ok
            && self.location.as_ref().is_none_or(|l| &event.location == l)
            && self.segment.as_ref().is_none_or(|s| &event.segment == s)
            && self
                .created_by
                .as_ref()
                .is_none_or(|c| &event.created_by == c)
    }
}
