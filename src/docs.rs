use utoipa::OpenApi;

use evently_models::{
    CreateEventDto, CreateLinkDto, Event, EventFilterParams, Link, SocialNet, UpdateEventDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::events::controller::get_events,
        crate::modules::events::controller::create_event,
        crate::modules::events::controller::get_event,
        crate::modules::events::controller::replace_event,
        crate::modules::events::controller::update_event,
        crate::modules::events::controller::delete_event,
        crate::modules::events::controller::get_links,
        crate::modules::events::controller::add_link,
    ),
    components(
        schemas(
            Event,
            CreateEventDto,
            UpdateEventDto,
            EventFilterParams,
            Link,
            CreateLinkDto,
            SocialNet,
        )
    ),
    tags(
        (name = "Events", description = "Event management endpoints. Reads are cached; writes invalidate.")
    ),
    info(
        title = "Evently API",
        version = "0.1.0",
        description = "Event management API with read-through caching, built with Rust, Axum, and PostgreSQL. A GraphQL endpoint is served at /graphql/.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;
