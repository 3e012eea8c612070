//! Discovery augmentation for `GET /apis`.
//!
//! The upstream's `APIGroupList` is buffered, the virtual group is appended
//! and only the synthesized document is sent back. Upstream headers are not
//! forwarded for this route.

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{ACCEPT_ENCODING, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ProxyError;
use crate::http::middleware::transform::{read_body, set_length, VirtualGroup};
use crate::rewrite::add_synthetic_group;

pub async fn augment_discovery(
    State(group): State<VirtualGroup>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ProxyError> {
    if request.method() != Method::GET {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }
    request.headers_mut().remove(ACCEPT_ENCODING);

    let response = next.run(request).await;
    let upstream_status = response.status();
    let body = read_body(response.into_body()).await?;
    let body = add_synthetic_group(group.as_str(), &body)?;

    tracing::debug!(
        upstream_status = %upstream_status,
        group = group.as_str(),
        "Advertised virtual group"
    );

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    set_length(&mut headers, body.len());

    let mut response = Response::new(Body::from(body));
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, middleware, routing::any, Router};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(calls: Arc<AtomicUsize>, upstream_body: &'static str) -> Router {
        Router::new().route(
            "/apis",
            any(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    ([("x-upstream", "1")], upstream_body)
                }
            })
            .layer(middleware::from_fn_with_state(
                VirtualGroup::new("openshift.org"),
                augment_discovery,
            )),
        )
    }

    #[tokio::test]
    async fn test_get_appends_group() {
        let calls = Arc::new(AtomicUsize::new(0));
        let response = app(calls.clone(), r#"{"kind":"APIGroupList","groups":[]}"#)
            .oneshot(Request::get("/apis").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-upstream").is_none());
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let list: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(list["groups"].as_array().unwrap().len(), 1);
        assert_eq!(list["groups"][0]["name"], "openshift.org");
        assert_eq!(list["groups"][0]["preferredVersion"]["version"], "v1");
    }

    #[tokio::test]
    async fn test_other_methods_rejected_without_upstream_call() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let calls = Arc::new(AtomicUsize::new(0));
            let request = Request::builder()
                .method(method)
                .uri("/apis")
                .body(Body::empty())
                .unwrap();
            let response = app(calls.clone(), "{}").oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(body.is_empty());
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_undecodable_listing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let response = app(calls, "Forbidden")
            .oneshot(Request::get("/apis").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
