//! Redis cache backend for caching shared across API instances.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::keys::namespaced;
use crate::store::{CacheError, CacheStore};

/// Number of keys requested per SCAN round trip during pattern deletion.
const SCAN_BATCH: usize = 100;

/// Redis cache client with connection pooling.
///
/// Every key and pattern is namespaced with the configured prefix, so several
/// deployments can share one Redis.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    key_prefix: String,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Creates a new Redis cache client.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `key_prefix` - Namespace for every key, empty for none
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if connection fails.
    pub async fn new(redis_url: &str, key_prefix: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            key_prefix: key_prefix.to_owned(),
        })
    }

    fn key(&self, key: &str) -> String {
        namespaced(&self.key_prefix, key)
    }

    /// Gets the remaining TTL for a key in seconds.
    ///
    /// Returns `None` if the key doesn't exist or has no TTL.
    #[instrument(skip(self), fields(cache.operation = "TTL"))]
    pub async fn ttl(&self, key: &str) -> Option<i64> {
        let mut conn = self.conn.clone();

        match conn.ttl::<_, i64>(self.key(key)).await {
            Ok(ttl) if ttl > 0 => Some(ttl),
            Ok(_) => None, // -1 (no expiry) or -2 (doesn't exist)
            Err(e) => {
                error!(cache.key = %key, error = %e, "Redis TTL error");
                None
            }
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();

        let value: Option<Vec<u8>> = conn.get(self.key(key)).await?;
        debug!(cache.key = %key, cache.hit = value.is_some(), "Cache lookup");

        Ok(value)
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(self.key(key), value, seconds).await?;

        debug!(cache.key = %key, cache.ttl_secs = %seconds, "Cache set");

        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();

        let removed: u64 = conn.del(self.key(key)).await?;

        debug!(cache.key = %key, cache.deleted = removed, "Cache invalidated");

        Ok(removed > 0)
    }

    /// Deletes every key matching a pattern.
    ///
    /// Uses SCAN rather than KEYS, so large keyspaces are walked incrementally
    /// without blocking the server.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let pattern = self.key(pattern);
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = %deleted, "Pattern invalidation complete");

        Ok(deleted)
    }

    #[instrument(skip(self), fields(cache.operation = "EXISTS"))]
    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();

        Ok(conn.exists(self.key(key)).await?)
    }
}
