use evently_cache::{CacheModel, CachedJson, MutationKind};
use evently_core::AppError;
use evently_db::StoreError;
use evently_models::{
    CreateEventDto, CreateLinkDto, Event, EventFilterParams, Link, UpdateEventDto,
};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::metrics::track_event_mutation;
use crate::state::AppState;

pub struct EventService;

impl EventService {
    /// Lists events through the list cache.
    ///
    /// `params` is the raw query string; it keys the cache while `filters`
    /// drives the store.
    #[instrument(skip(state, params))]
    pub async fn get_events(
        state: &AppState,
        params: Vec<(String, String)>,
        filters: EventFilterParams,
    ) -> Result<CachedJson, AppError> {
        let store = &state.store;
        state
            .reads
            .list(Event::MODEL_NAME, params, || async move {
                store.list(&filters).await.map_err(map_store_error)
            })
            .await
    }

    #[instrument(skip(state), fields(event.id = %id))]
    pub async fn get_event(state: &AppState, id: Uuid) -> Result<CachedJson, AppError> {
        let store = &state.store;
        state
            .reads
            .detail(Event::MODEL_NAME, &id.to_string(), || async move {
                store.get(id).await.map_err(map_store_error)
            })
            .await
    }

    #[instrument(skip(state, dto), fields(event.name = %dto.name))]
    pub async fn create_event(state: &AppState, dto: CreateEventDto) -> Result<Event, AppError> {
        dto.validate().map_err(AppError::unprocessable)?;

        let event = state.store.create(dto).await.map_err(map_store_error)?;
        state
            .invalidator
            .after_write(&event, MutationKind::Created)
            .await;
        track_event_mutation(MutationKind::Created);

        Ok(event)
    }

    #[instrument(skip(state, changes), fields(event.id = %id))]
    pub async fn update_event(
        state: &AppState,
        id: Uuid,
        changes: UpdateEventDto,
    ) -> Result<Event, AppError> {
        changes.validate().map_err(AppError::unprocessable)?;

        let event = state
            .store
            .update(id, changes)
            .await
            .map_err(map_store_error)?;
        state
            .invalidator
            .after_write(&event, MutationKind::Updated)
            .await;
        track_event_mutation(MutationKind::Updated);

        Ok(event)
    }

    /// Deletes an event. Its cache keys are captured before the row is gone.
    #[instrument(skip(state), fields(event.id = %id))]
    pub async fn delete_event(state: &AppState, id: Uuid) -> Result<(), AppError> {
        let event = state.store.get(id).await.map_err(map_store_error)?;
        let plan = state.invalidator.plan(&event, MutationKind::Deleted);

        state.store.delete(id).await.map_err(map_store_error)?;

        if let Some(plan) = plan {
            state.invalidator.execute(&plan).await;
        }
        track_event_mutation(MutationKind::Deleted);

        Ok(())
    }

    /// Attaches a link to an event.
    ///
    /// `Link` is not registered for invalidation, so cached event reads are
    /// left untouched.
    #[instrument(skip(state, dto), fields(event.id = %event_id))]
    pub async fn add_link(
        state: &AppState,
        event_id: Uuid,
        dto: CreateLinkDto,
    ) -> Result<Link, AppError> {
        dto.validate().map_err(AppError::unprocessable)?;

        let link = state
            .store
            .add_link(event_id, dto)
            .await
            .map_err(map_store_error)?;
        state
            .invalidator
            .after_write(&link, MutationKind::Created)
            .await;

        Ok(link)
    }

    #[instrument(skip(state), fields(event.id = %event_id))]
    pub async fn get_links(state: &AppState, event_id: Uuid) -> Result<Vec<Link>, AppError> {
        state.store.get(event_id).await.map_err(map_store_error)?;
        state.store.links_for(event_id).await.map_err(map_store_error)
    }
}

pub fn map_store_error(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound(_) => AppError::not_found(err),
        StoreError::Conflict(_) => AppError::conflict(err),
        StoreError::Validation(_) => AppError::unprocessable(err),
        StoreError::Database(_) => AppError::internal(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_store_errors_map_to_statuses() {
        assert_eq!(
            map_store_error(StoreError::not_found(Uuid::nil())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            map_store_error(StoreError::ambiguous_name("Conf")).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            map_store_error(StoreError::Validation("too long".into())).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            map_store_error(StoreError::Database(sqlx::Error::RowNotFound)).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
