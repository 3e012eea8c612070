//! Path prefix rewriting.
//!
//! Maps the client-visible route of the virtual group onto the upstream's
//! native route, e.g. `/apis/openshift.org/v1/projects` → `/oapi/v1/projects`.
//! The query string is carried over unchanged.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{uri::PathAndQuery, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ProxyError;

/// Prefix to remove and prefix to add.
#[derive(Debug, Clone)]
pub struct PathRewrite {
    strip: Arc<str>,
    prepend: Arc<str>,
}

impl PathRewrite {
    pub fn new(strip: impl Into<Arc<str>>, prepend: impl Into<Arc<str>>) -> Self {
        Self {
            strip: strip.into(),
            prepend: prepend.into(),
        }
    }

    /// Rewritten URI, or `None` when `uri` does not carry the stripped prefix.
    pub fn apply(&self, uri: &Uri) -> Option<Result<Uri, ProxyError>> {
        let rest = uri.path().strip_prefix(&*self.strip)?;

        let mut target = format!("{}{}", self.prepend, rest);
        if let Some(query) = uri.query() {
            target.push('?');
            target.push_str(query);
        }

        Some(build_uri(uri, target))
    }
}

fn build_uri(original: &Uri, path_and_query: String) -> Result<Uri, ProxyError> {
    let path_and_query = PathAndQuery::try_from(path_and_query)
        .map_err(|e| ProxyError::InvalidPath(e.to_string()))?;
    let mut parts = original.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).map_err(|e| ProxyError::InvalidPath(e.to_string()))
}

pub async fn rewrite_path(
    State(rewrite): State<PathRewrite>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match rewrite.apply(request.uri()) {
        Some(Ok(uri)) => {
            tracing::trace!(from = %request.uri(), to = %uri, "Rewrote path");
            *request.uri_mut() = uri;
            next.run(request).await
        }
        Some(Err(e)) => e.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, middleware, routing::any, Router};
    use tower::ServiceExt;

    fn rewrite() -> PathRewrite {
        PathRewrite::new("/apis/openshift.org", "/oapi")
    }

    #[test]
    fn test_apply() {
        let uri: Uri = "/apis/openshift.org/v1/projects".parse().unwrap();
        let out = rewrite().apply(&uri).unwrap().unwrap();
        assert_eq!(out, "/oapi/v1/projects");
    }

    #[test]
    fn test_apply_keeps_query() {
        let uri: Uri = "/apis/openshift.org/v1/projects?labelSelector=a%3Db"
            .parse()
            .unwrap();
        let out = rewrite().apply(&uri).unwrap().unwrap();
        assert_eq!(out.path(), "/oapi/v1/projects");
        assert_eq!(out.query(), Some("labelSelector=a%3Db"));
    }

    #[test]
    fn test_apply_group_root() {
        let uri: Uri = "/apis/openshift.org/".parse().unwrap();
        assert_eq!(rewrite().apply(&uri).unwrap().unwrap(), "/oapi/");
    }

    #[test]
    fn test_apply_without_prefix() {
        let uri: Uri = "/api/v1/pods".parse().unwrap();
        assert!(rewrite().apply(&uri).is_none());
    }

    #[tokio::test]
    async fn test_middleware_rewrites_before_inner_handler() {
        async fn echo_uri(request: Request<Body>) -> String {
            request.uri().to_string()
        }

        let app = Router::new()
            .route("/{*path}", any(echo_uri))
            .layer(middleware::from_fn_with_state(rewrite(), rewrite_path));

        let response = app
            .clone()
            .oneshot(
                Request::get("/apis/openshift.org/v1/builds?watch=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"/oapi/v1/builds?watch=0");

        let response = app
            .oneshot(Request::get("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
