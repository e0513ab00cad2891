use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use evently::evently_cache::{CacheConfig, CacheError, CacheStore, MemoryCache, SharedCache};
use evently::evently_config::CorsConfig;
use evently::evently_db::MemoryEventStore;
use evently::router::init_router;
use evently::state::AppState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// The full router over an in-memory store and cache.
///
/// `store` and `cache` are the same instances the router uses, so tests can
/// change data behind the cache or inspect what it holds.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub store: MemoryEventStore,
    pub cache: SharedCache,
}

#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn x_cache(&self) -> Option<&str> {
        self.headers
            .get("x-cache")
            .map(|v| v.to_str().unwrap())
    }
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::memory())
    }

    pub fn with_config(cache_config: CacheConfig) -> Self {
        let cache: SharedCache = Arc::new(MemoryCache::new(cache_config.memory_max_entries));
        Self::with_cache(cache, cache_config)
    }

    /// Every cache call fails, as with an unreachable Redis.
    pub fn with_cache_down() -> Self {
        Self::with_cache(Arc::new(DownCache), CacheConfig::memory())
    }

    pub fn with_cache(cache: SharedCache, cache_config: CacheConfig) -> Self {
        let store = MemoryEventStore::new();
        let state = AppState::new(
            Arc::new(store.clone()),
            cache.clone(),
            cache_config,
            CorsConfig::default(),
        );

        Self {
            router: init_router(state),
            store,
            cache,
        }
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request("GET", uri, None).await
    }

    /// Creates an event through the API and returns its JSON.
    pub async fn create_event(&self, name: &str) -> Value {
        let response = self
            .request("POST", "/events/", Some(event_payload(name)))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.json()
    }

    pub async fn graphql(
        &self,
        operation_name: Option<&str>,
        query: &str,
        variables: Value,
    ) -> Value {
        let mut body = json!({ "query": query, "variables": variables });
        if let Some(name) = operation_name {
            body["operationName"] = json!(name);
        }

        let response = self.request("POST", "/graphql/", Some(body)).await;
        assert_eq!(response.status, StatusCode::OK);
        response.json()
    }
}

#[allow(dead_code)]
pub fn event_payload(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Talks and workshops",
        "start_date": "2025-03-01T09:00:00Z",
        "end_date": "2025-03-02T18:00:00Z"
    })
}

#[allow(dead_code)]
fn down(operation: &'static str) -> CacheError {
    CacheError::Timeout {
        operation,
        elapsed: Duration::ZERO,
    }
}

#[allow(dead_code)]
#[derive(Debug)]
pub struct DownCache;

#[async_trait]
impl CacheStore for DownCache {
    async fn get(&self, _: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(down("GET"))
    }

    async fn set(&self, _: &str, _: &[u8], _: Duration) -> Result<(), CacheError> {
        Err(down("SETEX"))
    }

    async fn delete(&self, _: &str) -> Result<bool, CacheError> {
        Err(down("DEL"))
    }

    async fn delete_matching(&self, _: &str) -> Result<u64, CacheError> {
        Err(down("SCAN_DEL"))
    }

    async fn has(&self, _: &str) -> Result<bool, CacheError> {
        Err(down("EXISTS"))
    }
}
