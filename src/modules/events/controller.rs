use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use evently_cache::CachedJson;
use evently_core::AppError;
use evently_models::{
    CreateEventDto, CreateLinkDto, Event, EventFilterParams, Link, UpdateEventDto,
};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::modules::events::service::EventService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/events/",
    params(EventFilterParams),
    responses(
        (status = 200, description = "List of events, newest first (cached for 5 minutes)", body = [Event],
            headers(("x-cache" = String, description = "HIT or MISS")))
    ),
    tag = "Events"
)]
#[instrument(skip(state, params))]
pub async fn get_events(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<CachedJson, AppError> {
    let filters = EventFilterParams::from_pairs(params.iter().map(|(k, v)| (k, v)));
    EventService::get_events(&state, params, filters).await
}

#[utoipa::path(
    post,
    path = "/events/",
    request_body = CreateEventDto,
    responses(
        (status = 201, description = "Event created successfully", body = Event),
        (status = 422, description = "Invalid input")
    ),
    tag = "Events"
)]
#[instrument(skip(state, dto))]
pub async fn create_event(
    State(state): State<AppState>,
    Json(dto): Json<CreateEventDto>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = EventService::create_event(&state, dto).await?;

    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    get,
    path = "/events/{id}/",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event details (cached for 30 minutes)", body = Event,
            headers(("x-cache" = String, description = "HIT or MISS"))),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
)]
#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<CachedJson, AppError> {
    EventService::get_event(&state, id).await
}

#[utoipa::path(
    put,
    path = "/events/{id}/",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = CreateEventDto,
    responses(
        (status = 200, description = "Event replaced successfully", body = Event),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Invalid input")
    ),
    tag = "Events"
)]
#[instrument(skip(state, dto))]
pub async fn replace_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<CreateEventDto>,
) -> Result<Json<Event>, AppError> {
    dto.validate().map_err(AppError::unprocessable)?;

    let event = EventService::update_event(&state, id, UpdateEventDto::from(dto)).await?;

    Ok(Json(event))
}

#[utoipa::path(
    patch,
    path = "/events/{id}/",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = UpdateEventDto,
    responses(
        (status = 200, description = "Event updated successfully", body = Event),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Invalid input")
    ),
    tag = "Events"
)]
#[instrument(skip(state, dto))]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateEventDto>,
) -> Result<Json<Event>, AppError> {
    let event = EventService::update_event(&state, id, dto).await?;

    Ok(Json(event))
}

#[utoipa::path(
    delete,
    path = "/events/{id}/",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 204, description = "Event deleted successfully"),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
)]
#[instrument(skip(state))]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    EventService::delete_event(&state, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/events/{id}/links/",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Links of the event", body = [Link]),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
)]
#[instrument(skip(state))]
pub async fn get_links(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Link>>, AppError> {
    let links = EventService::get_links(&state, id).await?;

    Ok(Json(links))
}

#[utoipa::path(
    post,
    path = "/events/{id}/links/",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = CreateLinkDto,
    responses(
        (status = 201, description = "Link added", body = Link),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Invalid input")
    ),
    tag = "Events"
)]
#[instrument(skip(state, dto))]
pub async fn add_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<CreateLinkDto>,
) -> Result<(StatusCode, Json<Link>), AppError> {
    let link = EventService::add_link(&state, id, dto).await?;

    Ok((StatusCode::CREATED, Json(link)))
}
