//! Read-through caching of list, detail, and GraphQL reads.
//!
//! A lookup either returns the stored payload untouched (`HIT`) or runs the
//! loader, stores its serialized result under the read's TTL, and returns it
//! (`MISS`). The cache is never required for correctness: an unreachable,
//! slow, or corrupt cache degrades to a miss, and a failed write only costs
//! the next reader a round trip to the store.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, instrument, warn};

use crate::config::CacheConfig;
use crate::keys::{OperationSignature, detail_key, list_key};
use crate::store::{CacheError, SharedCache, bounded};

/// How a read was served.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Caching was disabled for this read.
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

/// Serialized JSON payload plus how it was obtained.
#[derive(Clone, Debug)]
pub struct CachedJson {
    pub body: Bytes,
    pub status: CacheStatus,
}

/// Typed value plus how it was obtained.
#[derive(Clone, Debug)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

/// Read-through wrapper around a [`SharedCache`].
#[derive(Clone, Debug)]
pub struct ReadThrough {
    cache: SharedCache,
    list_ttl: Duration,
    detail_ttl: Duration,
    graphql_ttl: Duration,
    timeout: Duration,
    graphql_caching: bool,
}

impl ReadThrough {
    pub fn new(cache: SharedCache, config: &CacheConfig) -> Self {
        Self {
            cache,
            list_ttl: config.list_ttl(),
            detail_ttl: config.detail_ttl(),
            graphql_ttl: config.graphql_ttl(),
            timeout: config.timeout(),
            graphql_caching: config.graphql_caching,
        }
    }

    /// Cached list read of `model` filtered by the raw query parameters.
    pub async fn list<P, K, V, T, E, F, Fut>(
        &self,
        model: &str,
        params: P,
        load: F,
    ) -> Result<CachedJson, E>
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = list_key(model, params);
        self.fetch_json("list", &key, self.list_ttl, load).await
    }

    /// Cached read of a single entity.
    pub async fn detail<T, E, F, Fut>(&self, model: &str, id: &str, load: F) -> Result<CachedJson, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = detail_key(model, id);
        self.fetch_json("detail", &key, self.detail_ttl, load).await
    }

    /// Cached GraphQL resolver result, keyed by the operation it serves.
    ///
    /// Without a signature, or with GraphQL caching turned off, the loader
    /// runs directly.
    pub async fn graphql<T, E, F, Fut>(
        &self,
        signature: Option<&OperationSignature>,
        load: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match signature {
            Some(signature) if self.graphql_caching => {
                self.fetch("graphql", &signature.key(), self.graphql_ttl, load)
                    .await
            }
            _ => {
                counter!("cache_lookups_total", "scope" => "graphql", "result" => "bypass")
                    .increment(1);
                Ok(Cached {
                    value: load().await?,
                    status: CacheStatus::Bypass,
                })
            }
        }
    }

    /// Returns the JSON stored under `key`, or loads, stores, and returns it.
    ///
    /// A hit is returned byte for byte as it was stored.
    #[instrument(skip(self, load), fields(cache.key = %key, cache.scope = scope))]
    pub async fn fetch_json<T, E, F, Fut>(
        &self,
        scope: &'static str,
        key: &str,
        ttl: Duration,
        load: F,
    ) -> Result<CachedJson, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(bytes) = self.lookup(scope, key).await {
            if serde_json::from_slice::<IgnoredAny>(&bytes).is_ok() {
                record_lookup(scope, CacheStatus::Hit);
                return Ok(CachedJson {
                    body: Bytes::from(bytes),
                    status: CacheStatus::Hit,
                });
            }
            warn!(cache.key = %key, "Cached payload is not valid JSON, evicting");
            self.evict(key).await;
        }
        record_lookup(scope, CacheStatus::Miss);

        let fresh = load().await?;
        let body = serde_json::to_vec(&fresh).map_err(CacheError::from)?;
        self.store(scope, key, &body, ttl).await;

        Ok(CachedJson {
            body: Bytes::from(body),
            status: CacheStatus::Miss,
        })
    }

    /// Typed variant of [`fetch_json`](Self::fetch_json).
    ///
    /// A stored payload that no longer deserializes into `T` is evicted and
    /// treated as a miss.
    #[instrument(skip(self, load), fields(cache.key = %key, cache.scope = scope))]
    pub async fn fetch<T, E, F, Fut>(
        &self,
        scope: &'static str,
        key: &str,
        ttl: Duration,
        load: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(bytes) = self.lookup(scope, key).await {
            match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    record_lookup(scope, CacheStatus::Hit);
                    return Ok(Cached {
                        value,
                        status: CacheStatus::Hit,
                    });
                }
                Err(e) => {
                    warn!(cache.key = %key, error = %e, "Failed to deserialize cached value, evicting");
                    self.evict(key).await;
                }
            }
        }
        record_lookup(scope, CacheStatus::Miss);

        let value = load().await?;
        let body = serde_json::to_vec(&value).map_err(CacheError::from)?;
        self.store(scope, key, &body, ttl).await;

        Ok(Cached {
            value,
            status: CacheStatus::Miss,
        })
    }

    async fn lookup(&self, scope: &'static str, key: &str) -> Option<Vec<u8>> {
        match bounded(self.timeout, "GET", self.cache.get(key)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(cache.key = %key, cache.scope = scope, error = %e, "Cache lookup failed, treating as miss");
                counter!("cache_lookups_total", "scope" => scope, "result" => "error").increment(1);
                None
            }
        }
    }

    async fn store(&self, scope: &'static str, key: &str, body: &[u8], ttl: Duration) {
        match bounded(self.timeout, "SETEX", self.cache.set(key, body, ttl)).await {
            Ok(()) => debug!(cache.key = %key, cache.ttl_secs = ttl.as_secs(), "Cached fresh result"),
            Err(e) => {
                warn!(cache.key = %key, error = %e, "Failed to write cache entry");
                counter!("cache_write_failures_total", "scope" => scope).increment(1);
            }
        }
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = bounded(self.timeout, "DEL", self.cache.delete(key)).await {
            warn!(cache.key = %key, error = %e, "Failed to evict corrupt cache entry");
        }
    }
}

fn record_lookup(scope: &'static str, status: CacheStatus) {
    let result = match status {
        CacheStatus::Hit => "hit",
        CacheStatus::Miss => "miss",
        CacheStatus::Bypass => "bypass",
    };
    counter!("cache_lookups_total", "scope" => scope, "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCache;
    use crate::store::CacheStore;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
    }

    #[derive(Debug, thiserror::Error)]
    enum LoadError {
        #[error("not found")]
        NotFound,
        #[error(transparent)]
        Cache(#[from] CacheError),
    }

    /// Store whose every call fails as if Redis were down.
    #[derive(Debug)]
    struct DownCache;

    #[async_trait]
    impl CacheStore for DownCache {
        async fn get(&self, _: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(unavailable())
        }
        async fn set(&self, _: &str, _: &[u8], _: Duration) -> Result<(), CacheError> {
            Err(unavailable())
        }
        async fn delete(&self, _: &str) -> Result<bool, CacheError> {
            Err(unavailable())
        }
        async fn delete_matching(&self, _: &str) -> Result<u64, CacheError> {
            Err(unavailable())
        }
        async fn has(&self, _: &str) -> Result<bool, CacheError> {
            Err(unavailable())
        }
    }

    fn unavailable() -> CacheError {
        CacheError::Timeout {
            operation: "TEST",
            elapsed: Duration::ZERO,
        }
    }

    /// Store that never answers.
    #[derive(Debug)]
    struct HangingCache;

    #[async_trait]
    impl CacheStore for HangingCache {
        async fn get(&self, _: &str) -> Result<Option<Vec<u8>>, CacheError> {
            std::future::pending().await
        }
        async fn set(&self, _: &str, _: &[u8], _: Duration) -> Result<(), CacheError> {
            std::future::pending().await
        }
        async fn delete(&self, _: &str) -> Result<bool, CacheError> {
            std::future::pending().await
        }
        async fn delete_matching(&self, _: &str) -> Result<u64, CacheError> {
            std::future::pending().await
        }
        async fn has(&self, _: &str) -> Result<bool, CacheError> {
            std::future::pending().await
        }
    }

    fn reads_over(cache: SharedCache) -> ReadThrough {
        ReadThrough::new(cache, &CacheConfig::memory())
    }

    fn rows(names: &[&str]) -> Vec<Row> {
        names
            .iter()
            .map(|n| Row {
                name: n.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_miss_then_identical_hit() {
        let reads = reads_over(Arc::new(MemoryCache::new(16)));
        let loads = AtomicUsize::new(0);
        let counter = &loads;
        let load = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, LoadError>(rows(&["Conf", "Meetup"]))
        };

        let first = reads.list("event", [("segment", "Tech")], load).await.unwrap();
        let second = reads.list("event", [("segment", "Tech")], load).await.unwrap();

        assert_eq!(first.status, CacheStatus::Miss);
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(first.body, second.body);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hit_is_not_revalidated_against_store() {
        let reads = reads_over(Arc::new(MemoryCache::new(16)));

        reads
            .detail("event", "1", || async { Ok::<_, LoadError>(rows(&["Old"])) })
            .await
            .unwrap();
        let hit = reads
            .detail("event", "1", || async { Ok::<_, LoadError>(rows(&["New"])) })
            .await
            .unwrap();

        assert_eq!(hit.status, CacheStatus::Hit);
        assert_eq!(hit.body, Bytes::from_static(br#"[{"name":"Old"}]"#));
    }

    #[tokio::test]
    async fn test_load_errors_propagate_and_are_not_cached() {
        let cache = Arc::new(MemoryCache::new(16));
        let reads = reads_over(cache.clone());

        let result = reads
            .detail("event", "missing", || async { Err::<Row, _>(LoadError::NotFound) })
            .await;

        assert!(matches!(result, Err(LoadError::NotFound)));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_unavailable_cache_serves_from_store() {
        let reads = reads_over(Arc::new(DownCache));

        for _ in 0..2 {
            let read = reads
                .list("event", Vec::<(String, String)>::new(), || async {
                    Ok::<_, LoadError>(rows(&["Conf"]))
                })
                .await
                .unwrap();
            assert_eq!(read.status, CacheStatus::Miss);
            assert_eq!(read.body, Bytes::from_static(br#"[{"name":"Conf"}]"#));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cache_fails_open() {
        let reads = reads_over(Arc::new(HangingCache));

        let read = reads
            .detail("event", "1", || async { Ok::<_, LoadError>(rows(&["Conf"])) })
            .await
            .unwrap();

        assert_eq!(read.status, CacheStatus::Miss);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_evicted_and_reloaded() {
        let cache = Arc::new(MemoryCache::new(16));
        let reads = reads_over(cache.clone());
        let key = detail_key("event", "1");
        cache
            .set(&key, b"{not json", Duration::from_secs(60))
            .await
            .unwrap();

        let read = reads
            .detail("event", "1", || async { Ok::<_, LoadError>(rows(&["Conf"])) })
            .await
            .unwrap();

        assert_eq!(read.status, CacheStatus::Miss);
        assert_eq!(cache.get(&key).await.unwrap(), Some(read.body.to_vec()));
    }

    #[tokio::test]
    async fn test_typed_fetch_evicts_payload_of_wrong_shape() {
        let cache = Arc::new(MemoryCache::new(16));
        let reads = reads_over(cache.clone());
        cache
            .set("gql_x", br#"{"unexpected":true}"#, Duration::from_secs(60))
            .await
            .unwrap();

        let read = reads
            .fetch("graphql", "gql_x", Duration::from_secs(60), || async {
                Ok::<_, LoadError>(rows(&["Conf"]))
            })
            .await
            .unwrap();

        assert_eq!(read.status, CacheStatus::Miss);
        assert_eq!(read.value, rows(&["Conf"]));
    }

    #[tokio::test]
    async fn test_graphql_caches_by_signature() {
        let reads = reads_over(Arc::new(MemoryCache::new(16)));
        let signature =
            OperationSignature::new(None, serde_json::json!({}), "{ allEvents { name } }");

        let first = reads
            .graphql(Some(&signature), || async { Ok::<_, LoadError>(rows(&["Conf"])) })
            .await
            .unwrap();
        let second = reads
            .graphql(Some(&signature), || async { Ok::<_, LoadError>(rows(&["Other"])) })
            .await
            .unwrap();

        assert_eq!(first.status, CacheStatus::Miss);
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(second.value, rows(&["Conf"]));
    }

    #[tokio::test]
    async fn test_graphql_bypass() {
        let config = CacheConfig {
            graphql_caching: false,
            ..CacheConfig::memory()
        };
        let reads = ReadThrough::new(Arc::new(MemoryCache::new(16)), &config);
        let signature =
            OperationSignature::new(None, serde_json::json!({}), "{ allEvents { name } }");

        let disabled = reads
            .graphql(Some(&signature), || async { Ok::<_, LoadError>(rows(&["Conf"])) })
            .await
            .unwrap();
        assert_eq!(disabled.status, CacheStatus::Bypass);

        let reads = reads_over(Arc::new(MemoryCache::new(16)));
        let unsigned = reads
            .graphql(None, || async { Ok::<_, LoadError>(rows(&["Conf"])) })
            .await
            .unwrap();
        assert_eq!(unsigned.status, CacheStatus::Bypass);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_misses_after_ttl() {
        let reads = reads_over(Arc::new(MemoryCache::new(16)));
        let load = || async { Ok::<_, LoadError>(rows(&["Conf"])) };

        reads.list("event", [("a", "1")], load).await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let cached = reads.list("event", [("a", "1")], load).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        let expired = reads.list("event", [("a", "1")], load).await.unwrap();

        assert_eq!(cached.status, CacheStatus::Hit);
        assert_eq!(expired.status, CacheStatus::Miss);
    }
}
