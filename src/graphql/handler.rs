use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{Extension, response::Html};
use evently_cache::OperationSignature;
use tracing::instrument;

use super::schema::EventSchema;

/// Executes a GraphQL request.
///
/// The request's operation name, variables, and query text are handed to the
/// resolvers so cached fields can be keyed by the operation they serve.
#[instrument(skip_all)]
pub async fn graphql_handler(
    Extension(schema): Extension<EventSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let request = req.into_inner();
    let signature = OperationSignature::new(
        request.operation_name.clone(),
        serde_json::to_value(&request.variables).unwrap_or_default(),
        request.query.clone(),
    );

    schema.execute(request.data(signature)).await.into()
}

pub async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql/").finish())
}
