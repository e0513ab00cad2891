//! GraphQL surface over the same store and cache as the REST routes.

pub mod handler;
pub mod schema;

pub use handler::{graphiql, graphql_handler};
pub use schema::{EventSchema, build_schema};
