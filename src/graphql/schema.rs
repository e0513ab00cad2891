use async_graphql::{
    ComplexObject, Context, EmptySubscription, Enum, Object, Result, Schema, SimpleObject,
};
use chrono::{DateTime, Utc};
use evently_cache::{MutationKind, OperationSignature};
use evently_models::{CreateEventDto, Event, EventFilterParams, Link, SocialNet};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::metrics::track_event_mutation;
use crate::state::AppState;

pub type EventSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(state: AppState) -> EventSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .finish()
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "Event", complex)]
pub struct EventObject {
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

impl From<Event> for EventObject {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            start_date: event.start_date,
            end_date: event.end_date,
            created_at: event.created_at,
            updated_at: event.updated_at,
            created_by: event.created_by,
            segment: event.segment,
            location: event.location,
        }
    }
}

#[ComplexObject]
impl EventObject {
    /// Resolved per execution on top of cached events.
    async fn related_links(&self, ctx: &Context<'_>) -> Result<Vec<LinkObject>> {
        let state = ctx.data::<AppState>()?;
        let links = state.store.links_for(self.id).await?;

        Ok(links.into_iter().map(LinkObject::from).collect())
    }
}

#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq)]
#[graphql(name = "SocialNet")]
pub enum SocialNetKind {
    Instagram,
    Linkedin,
}

impl From<SocialNet> for SocialNetKind {
    fn from(kind: SocialNet) -> Self {
        match kind {
            SocialNet::Instagram => Self::Instagram,
            SocialNet::Linkedin => Self::Linkedin,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "Link")]
pub struct LinkObject {
    pub id: i64,
    #[graphql(name = "type")]
    pub kind: SocialNetKind,
    pub link: String,
}

impl From<Link> for LinkObject {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            kind: link.kind.into(),
            link: link.link,
        }
    }
}

#[derive(SimpleObject)]
pub struct CreateEventPayload {
    pub event: EventObject,
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every event, newest first. Cached per operation.
    #[instrument(skip_all)]
    async fn all_events(&self, ctx: &Context<'_>) -> Result<Vec<EventObject>> {
        let state = ctx.data::<AppState>()?;
        let signature = ctx.data_opt::<OperationSignature>();
        let store = &state.store;

        let events = state
            .reads
            .graphql(signature, || async move {
                store
                    .list(&EventFilterParams::default())
                    .await
                    .map_err(async_graphql::Error::from)
            })
            .await?;

        Ok(events.value.into_iter().map(EventObject::from).collect())
    }

    #[instrument(skip(self, ctx))]
    async fn event(&self, ctx: &Context<'_>, id: Uuid) -> Result<EventObject> {
        let state = ctx.data::<AppState>()?;
        let event = state.store.get(id).await?;

        Ok(event.into())
    }

    #[instrument(skip(self, ctx))]
    async fn event_by_name(&self, ctx: &Context<'_>, name: String) -> Result<EventObject> {
        let state = ctx.data::<AppState>()?;
        let event = state.store.get_by_name(&name).await?;

        Ok(event.into())
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    #[instrument(skip(self, ctx, description))]
    #[allow(clippy::too_many_arguments)]
    async fn create_event(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        segment: Option<String>,
        location: Option<String>,
    ) -> Result<CreateEventPayload> {
        let state = ctx.data::<AppState>()?;

        let dto = CreateEventDto {
            name,
            description,
            start_date,
            end_date,
            created_by: None,
            segment,
            location,
        };
        dto.validate()?;

        let event = state.store.create(dto).await?;
        state
            .invalidator
            .after_write(&event, MutationKind::Created)
            .await;
        track_event_mutation(MutationKind::Created);

        Ok(CreateEventPayload {
            event: event.into(),
        })
    }
}
