//! In-process cache with LRU eviction and lazy TTL expiry.
//!
//! Used when no Redis is configured or reachable, and by the test suite.
//! Expired entries are treated as absent on access and removed at that point.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::keys::pattern_matches;
use crate::store::{CacheError, CacheStore};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe in-memory [`CacheStore`].
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
}

impl MemoryCache {
    /// Creates a cache holding at most `max_entries` entries.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        match store.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        store.pop(key);
        debug!(cache.key = %key, "Expired entry dropped");
        Ok(None)
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value: value.to_vec(),
            expires_at: Instant::now() + ttl,
        };
        self.store.write().await.put(key.to_owned(), entry);
        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        let removed = self.store.write().await.pop(key);
        Ok(removed.is_some_and(|entry| !entry.is_expired(now)))
    }

    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        let matching: Vec<String> = store
            .iter()
            .filter(|(key, _)| pattern_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();

        let mut deleted = 0;
        for key in matching {
            if store.pop(&key).is_some_and(|entry| !entry.is_expired(now)) {
                deleted += 1;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = deleted, "Pattern invalidation complete");
        Ok(deleted)
    }

    #[instrument(skip(self), fields(cache.operation = "EXISTS"))]
    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        let store = self.store.read().await;
        Ok(store.peek(key).is_some_and(|entry| !entry.is_expired(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCache::new(16);

        cache.set("event_detail_1", b"{}", MINUTE).await.unwrap();
        assert_eq!(cache.get("event_detail_1").await.unwrap(), Some(b"{}".to_vec()));
        assert!(cache.has("event_detail_1").await.unwrap());

        assert!(cache.delete("event_detail_1").await.unwrap());
        assert_eq!(cache.get("event_detail_1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_noop() {
        let cache = MemoryCache::new(16);
        assert!(!cache.delete("missing").await.unwrap());
        assert!(!cache.delete("missing").await.unwrap());
        assert_eq!(cache.delete_matching("event_list:*").await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl() {
        let cache = MemoryCache::new(16);
        cache.set("k", b"v", MINUTE).await.unwrap();

        tokio::time::advance(MINUTE - Duration::from_millis(1)).await;
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!cache.has("k").await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_matching_sweeps_only_pattern() {
        let cache = MemoryCache::new(16);
        cache.set("event_list:aaa", b"[]", MINUTE).await.unwrap();
        cache.set("event_list:bbb", b"[]", MINUTE).await.unwrap();
        cache.set("event_detail_1", b"{}", MINUTE).await.unwrap();
        cache.set("venue_list:aaa", b"[]", MINUTE).await.unwrap();

        assert_eq!(cache.delete_matching("event_list:*").await.unwrap(), 2);
        assert!(cache.has("event_detail_1").await.unwrap());
        assert!(cache.has("venue_list:aaa").await.unwrap());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = MemoryCache::new(2);
        cache.set("a", b"1", MINUTE).await.unwrap();
        cache.set("b", b"2", MINUTE).await.unwrap();
        cache.get("a").await.unwrap();
        cache.set("c", b"3", MINUTE).await.unwrap();

        assert!(cache.has("a").await.unwrap());
        assert!(!cache.has("b").await.unwrap());
        assert!(cache.has("c").await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised() {
        let cache = MemoryCache::new(0);
        cache.set("a", b"1", MINUTE).await.unwrap();
        assert!(cache.has("a").await.unwrap());
    }
}
