//! # Evently Cache
//!
//! Read-through and write-invalidate caching for the Evently API.
//!
//! This crate provides:
//! - A [`CacheStore`] contract with Redis and in-process backends
//! - Cache key policy for list, detail, and GraphQL reads
//! - [`ReadThrough`], which serves reads from the cache or loads and stores them
//! - [`CacheInvalidator`], which clears affected entries after writes
//! - Cache configuration from environment variables
//!
//! # Example
//!
//! ```ignore
//! use evently_cache::{CacheConfig, CacheInvalidator, MutationKind, ReadThrough, connect};
//!
//! let config = CacheConfig::from_env();
//! let cache = connect(&config).await;
//! let reads = ReadThrough::new(cache.clone(), &config);
//! let invalidator = CacheInvalidator::builder(cache)
//!     .register::<Event>()
//!     .sweep_graphql(config.shared_graphql_invalidation)
//!     .build();
//!
//! let page = reads.detail("event", &id, || store.get(id)).await?;
//! invalidator.after_write(&event, MutationKind::Updated).await;
//! ```

pub mod config;
pub mod invalidation;
pub mod keys;
pub mod memory;
pub mod read_through;
pub mod redis;
pub mod response;
pub mod store;

pub use config::{CacheBackend, CacheConfig};
pub use invalidation::{
    CacheInvalidator, CacheModel, Invalidatable, InvalidationPlan, InvalidationReport,
    InvalidationTargets, MutationKind,
};
pub use keys::{OperationSignature, detail_key, gql_key, list_key};
pub use memory::MemoryCache;
pub use read_through::{CacheStatus, Cached, CachedJson, ReadThrough};
pub use redis::RedisCache;
pub use response::X_CACHE;
pub use store::{CacheError, CacheStore, SharedCache, connect};
