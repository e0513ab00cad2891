//! HTTP responses for cached reads.
//!
//! A [`CachedJson`] is written out as-is with a JSON content type and an
//! `x-cache` header reporting whether the cache served it.

use axum::{
    body::Body,
    http::{
        HeaderName, HeaderValue, StatusCode,
        header::CONTENT_TYPE,
    },
    response::{IntoResponse, Response},
};

use crate::read_through::CachedJson;

/// Response header carrying the [`CacheStatus`](crate::CacheStatus) of a read.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

impl IntoResponse for CachedJson {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [
                (CONTENT_TYPE, HeaderValue::from_static("application/json")),
                (X_CACHE, HeaderValue::from_static(self.status.as_str())),
            ],
            Body::from(self.body),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_through::CacheStatus;
    use bytes::Bytes;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_hit_is_written_verbatim() {
        let cached = CachedJson {
            body: Bytes::from_static(br#"[{"name":"Conf"}]"#),
            status: CacheStatus::Hit,
        };

        let response = cached.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[X_CACHE], "HIT");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"[{"name":"Conf"}]"#);
    }

    #[test]
    fn test_miss_header() {
        let cached = CachedJson {
            body: Bytes::from_static(b"{}"),
            status: CacheStatus::Miss,
        };
        assert_eq!(cached.into_response().headers()[X_CACHE], "MISS");
    }
}
