//! The cache store contract shared by every backend.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{CacheBackend, CacheConfig};
use crate::memory::MemoryCache;
use crate::redis::RedisCache;

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Cache {operation} timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Whether the error means the store could not be reached in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout { .. })
    }
}

/// Key/value store with per-key TTL and pattern deletion.
///
/// Values are opaque bytes. Patterns use `*` as the only wildcard.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Returns the stored value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Removes a key. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Removes every key matching `pattern`. Returns the number removed.
    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError>;

    async fn has(&self, key: &str) -> Result<bool, CacheError>;
}

/// Cache handle injected into every component that reads or invalidates.
pub type SharedCache = Arc<dyn CacheStore>;

/// Runs a cache call under `limit`, mapping an elapsed deadline to
/// [`CacheError::Timeout`].
pub(crate) async fn bounded<T, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, CacheError>
where
    F: Future<Output = Result<T, CacheError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(CacheError::Timeout {
            operation,
            elapsed: limit,
        }),
    }
}

/// Builds the configured cache backend.
///
/// A Redis backend that cannot connect degrades to an in-process cache, since
/// the cache is never required for correctness.
pub async fn connect(config: &CacheConfig) -> SharedCache {
    match config.backend {
        CacheBackend::Memory => {
            info!(
                cache.backend = "memory",
                cache.capacity = config.memory_max_entries,
                "Using in-process cache"
            );
            Arc::new(MemoryCache::new(config.memory_max_entries))
        }
        CacheBackend::Redis => {
            let connecting = RedisCache::new(&config.redis_url, &config.key_prefix);
            match bounded(config.timeout() * 8, "CONNECT", connecting).await {
                Ok(cache) => {
                    info!(cache.backend = "redis", "Connected to Redis cache");
                    Arc::new(cache)
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Failed to connect to Redis, falling back to in-process cache"
                    );
                    Arc::new(MemoryCache::new(config.memory_max_entries))
                }
            }
        }
    }
}
