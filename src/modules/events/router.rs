use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    add_link, create_event, delete_event, get_event, get_events, get_links, replace_event,
    update_event,
};

/// Event routes, served both with and without a trailing slash.
pub fn init_events_router() -> Router<AppState> {
    let collection = || get(get_events).post(create_event);
    let item = || {
        get(get_event)
            .put(replace_event)
            .patch(update_event)
            .delete(delete_event)
    };
    let links = || get(get_links).post(add_link);

    Router::new()
        .route("/events", collection())
        .route("/events/", collection())
        .route("/events/{id}", item())
        .route("/events/{id}/", item())
        .route("/events/{id}/links", links())
        .route("/events/{id}/links/", links())
}
