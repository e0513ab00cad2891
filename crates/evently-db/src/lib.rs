//! # Evently DB
//!
//! Database pool and event storage for the Evently API.
//!
//! This crate provides connection pool initialization, migrations, and the
//! [`EventStore`] contract with a PostgreSQL and an in-memory implementation.
//!
//! # Example
//!
//! ```ignore
//! use evently_db::{PgEventStore, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&database_url).await?;
//! run_migrations(&pool).await?;
//! let store = PgEventStore::new(pool);
//! ```

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;
pub use store::{EventStore, SharedStore};

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Initializes a PostgreSQL connection pool.
///
/// The returned pool is cheaply cloneable and should be passed to the
/// application state for use in request handlers.
///
/// # Errors
///
/// Returns the driver error when the database cannot be reached.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Applies the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
