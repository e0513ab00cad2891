use std::sync::Arc;

use anyhow::Context;
use evently_cache::{CacheConfig, CacheInvalidator, ReadThrough, SharedCache, connect};
use evently_config::{CorsConfig, StoreBackend, StoreConfig};
use evently_db::{
    MemoryEventStore, PgEventStore, SharedStore, init_db_pool, run_migrations,
};
use evently_models::Event;
use tracing::info;

#[derive(Clone, Debug)]
pub struct AppState {
    pub store: SharedStore,
    pub cache: SharedCache,
    pub reads: ReadThrough,
    pub invalidator: CacheInvalidator,
    pub cache_config: CacheConfig,
    pub cors_config: CorsConfig,
}

impl AppState {
    /// Wires the read-through wrapper and the invalidation hook around `cache`.
    pub fn new(
        store: SharedStore,
        cache: SharedCache,
        cache_config: CacheConfig,
        cors_config: CorsConfig,
    ) -> Self {
        let reads = ReadThrough::new(cache.clone(), &cache_config);
        let invalidator = CacheInvalidator::builder(cache.clone())
            .register::<Event>()
            .sweep_graphql(cache_config.shared_graphql_invalidation)
            .timeout(cache_config.timeout())
            .sweep_timeout(cache_config.sweep_timeout())
            .build();

        Self {
            store,
            cache,
            reads,
            invalidator,
            cache_config,
            cors_config,
        }
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let store_config = StoreConfig::from_env();
    let cache_config = CacheConfig::from_env();

    let store: SharedStore = match store_config.backend {
        StoreBackend::Postgres => {
            let url = store_config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORE_BACKEND=postgres")?;
            let pool = init_db_pool(url)
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Arc::new(PgEventStore::new(pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory event store");
            Arc::new(MemoryEventStore::new())
        }
    };

    let cache = connect(&cache_config).await;

    Ok(AppState::new(
        store,
        cache,
        cache_config,
        CorsConfig::from_env(),
    ))
}
