//! # Evently Models
//!
//! Domain models and DTOs for the Evently API.
//!
//! # Modules
//!
//! - [`events`]: Event entity, request DTOs, and list filters
//! - [`links`]: Social links attached to an event
//!
//! # Example
//!
//! ```ignore
//! use evently_models::{CreateEventDto, Event};
//! use validator::Validate;
//!
//! dto.validate()?;
//! let event = store.create(dto).await?;
//! ```

pub mod events;
pub mod links;

pub use events::{
    CreateEventDto, DEFAULT_CREATED_BY, DEFAULT_LOCATION, DEFAULT_SEGMENT, Event,
    EventFilterParams, UpdateEventDto,
};
pub use links::{CreateLinkDto, Link, SocialNet};
