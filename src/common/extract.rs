// src/common/extract.rs

//! Extractors whose rejections render as `AppError` JSON bodies.

use axum::extract::{FromRequest, FromRequestParts};

use crate::common::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        routing::{get, post},
    };
    use serde::Deserialize;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Paging {
        limit: i64,
    }

    #[derive(Deserialize)]
    struct Named {
        name: String,
    }

    fn router() -> Router {
        Router::new()
            .route("/items/{id}", get(|AppPath(id): AppPath<Uuid>| async move { id.to_string() }))
            .route("/items", get(|AppQuery(q): AppQuery<Paging>| async move { q.limit.to_string() }))
            .route("/names", post(|AppJson(n): AppJson<Named>| async move { n.name }))
    }

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn malformed_path_is_a_json_bad_request() {
        let (status, body) = call(Request::get("/items/not-a-uuid").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_query_is_a_json_bad_request() {
        let (status, body) = call(Request::get("/items?limit=lots").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn body_errors_are_json_bad_requests() {
        let wrong_shape = Request::post("/names")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name": 7}"#))
            .unwrap();
        let (status, body) = call(wrong_shape).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let no_content_type = Request::post("/names").body(Body::from(r#"{"name":"x"}"#)).unwrap();
        let (status, body) = call(no_content_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn valid_requests_pass_through() {
        let ok = Request::post("/names")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Bolt"}"#))
            .unwrap();
        let response = router().oneshot(ok).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
