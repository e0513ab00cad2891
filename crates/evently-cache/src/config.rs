//! Cache configuration.
//!
//! Backend selection, Redis connection settings, and the TTL policy for each
//! kind of cached read, loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which [`CacheStore`](crate::CacheStore) implementation to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" | "inmemory" => Ok(Self::Memory),
            other => Err(format!("unknown cache backend `{other}`")),
        }
    }
}

/// Cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `CACHE_BACKEND`: `redis` or `memory` (default: `redis`)
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_PREFIX`: Namespace prepended to every Redis key (default: none)
/// - `CACHE_LIST_TTL_SECONDS`: TTL of list reads (default: `300`)
/// - `CACHE_DETAIL_TTL_SECONDS`: TTL of detail reads (default: `1800`)
/// - `CACHE_GRAPHQL_TTL_SECONDS`: TTL of cached GraphQL operations (default: `900`)
/// - `CACHE_TIMEOUT_MS`: Upper bound for a single cache call (default: `250`)
/// - `CACHE_SWEEP_TIMEOUT_MS`: Upper bound for one pattern sweep (default: `5000`)
/// - `CACHE_MEMORY_MAX_ENTRIES`: LRU capacity of the memory backend (default: `10000`)
/// - `GRAPHQL_CACHING`: Cache GraphQL list resolvers (default: `true`)
/// - `SHARED_GRAPHQL_INVALIDATION`: Writes also sweep GraphQL entries (default: `true`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Redis connection URL.
    pub redis_url: String,

    /// Prefix for all Redis keys, to share one Redis between deployments.
    pub key_prefix: String,

    pub list_ttl_seconds: u64,
    pub detail_ttl_seconds: u64,
    pub graphql_ttl_seconds: u64,

    /// Cache calls slower than this fail open.
    pub timeout_ms: u64,

    /// Pattern sweeps scan the keyspace and get their own bound.
    pub sweep_timeout_ms: u64,

    pub memory_max_entries: usize,

    pub graphql_caching: bool,
    pub shared_graphql_invalidation: bool,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| {
            lookup(name)
                .map(|v| {
                    let v = v.trim().to_ascii_lowercase();
                    v != "false" && v != "0" && v != "no"
                })
                .unwrap_or(default)
        };

        Self {
            backend: parsed(&lookup, "CACHE_BACKEND").unwrap_or(defaults.backend),
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            key_prefix: lookup("CACHE_PREFIX").unwrap_or(defaults.key_prefix),
            list_ttl_seconds: parsed(&lookup, "CACHE_LIST_TTL_SECONDS")
                .unwrap_or(defaults.list_ttl_seconds),
            detail_ttl_seconds: parsed(&lookup, "CACHE_DETAIL_TTL_SECONDS")
                .unwrap_or(defaults.detail_ttl_seconds),
            graphql_ttl_seconds: parsed(&lookup, "CACHE_GRAPHQL_TTL_SECONDS")
                .unwrap_or(defaults.graphql_ttl_seconds),
            timeout_ms: parsed(&lookup, "CACHE_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
            sweep_timeout_ms: parsed(&lookup, "CACHE_SWEEP_TIMEOUT_MS")
                .unwrap_or(defaults.sweep_timeout_ms),
            memory_max_entries: parsed(&lookup, "CACHE_MEMORY_MAX_ENTRIES")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.memory_max_entries),
            graphql_caching: flag("GRAPHQL_CACHING", defaults.graphql_caching),
            shared_graphql_invalidation: flag(
                "SHARED_GRAPHQL_INVALIDATION",
                defaults.shared_graphql_invalidation,
            ),
        }
    }

    /// Configuration for an in-process cache, used by tests and local runs.
    pub fn memory() -> Self {
        Self {
            backend: CacheBackend::Memory,
            ..Self::default()
        }
    }

    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_seconds)
    }

    pub fn detail_ttl(&self) -> Duration {
        Duration::from_secs(self.detail_ttl_seconds)
    }

    pub fn graphql_ttl(&self) -> Duration {
        Duration::from_secs(self.graphql_ttl_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sweep_timeout(&self) -> Duration {
        Duration::from_millis(self.sweep_timeout_ms)
    }
}

fn parsed<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse().ok())
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: "redis://127.0.0.1:6379".into(),
            key_prefix: String::new(),
            list_ttl_seconds: 60 * 5,
            detail_ttl_seconds: 60 * 30,
            graphql_ttl_seconds: 60 * 15,
            timeout_ms: 250,
            sweep_timeout_ms: 5_000,
            memory_max_entries: 10_000,
            graphql_caching: true,
            shared_graphql_invalidation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CacheConfig::from_lookup(|_| None);
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.list_ttl(), Duration::from_secs(300));
        assert_eq!(config.detail_ttl(), Duration::from_secs(1800));
        assert_eq!(config.sweep_timeout(), Duration::from_secs(5));
        assert!(config.sweep_timeout() > config.timeout());
        assert!(config.graphql_caching);
        assert!(config.shared_graphql_invalidation);
    }

    #[test]
    fn test_overrides() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("CACHE_BACKEND", "memory"),
            ("CACHE_LIST_TTL_SECONDS", "60"),
            ("CACHE_DETAIL_TTL_SECONDS", "120"),
            ("CACHE_PREFIX", "events_service"),
            ("GRAPHQL_CACHING", "false"),
            ("SHARED_GRAPHQL_INVALIDATION", "0"),
            ("CACHE_SWEEP_TIMEOUT_MS", "12000"),
        ]));

        assert_eq!(config.sweep_timeout(), Duration::from_secs(12));

        assert_eq!(config.backend, CacheBackend::Memory);
        assert_eq!(config.list_ttl(), Duration::from_secs(60));
        assert_eq!(config.detail_ttl(), Duration::from_secs(120));
        assert_eq!(config.key_prefix, "events_service");
        assert!(!config.graphql_caching);
        assert!(!config.shared_graphql_invalidation);
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("CACHE_BACKEND", "memcached"),
            ("CACHE_LIST_TTL_SECONDS", "five minutes"),
            ("CACHE_MEMORY_MAX_ENTRIES", "0"),
        ]));

        assert_eq!(config.backend, CacheBackend::Redis);
        assert_eq!(config.list_ttl_seconds, 300);
        assert_eq!(config.memory_max_entries, 10_000);
    }
}
