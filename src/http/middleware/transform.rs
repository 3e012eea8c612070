//! Bidirectional group rewriting of proxied bodies.
//!
//! # Data Flow
//! ```text
//! client ──POST {"apiVersion":"openshift.org/v1"}──▶ transform ──{"apiVersion":"v1"}──▶ upstream
//! client ◀──{"apiVersion":"openshift.org/v1"}─────── transform ◀──{"apiVersion":"v1"}── upstream
//! ```
//!
//! # Design Decisions
//! - The upstream response is buffered completely before anything is sent to
//!   the client: the rewritten body changes length and `Content-Length` must
//!   be right before the first byte goes out. Memory per in-flight request is
//!   therefore bounded only by the body size, and watch/streaming responses
//!   cannot pass through this stage.
//! - Only body-bearing mutations (POST, PUT, PATCH) have their request body
//!   rewritten; every response is rewritten.
//! - Requests ask the upstream for an identity-encoded body so the JSON can
//!   be decoded.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::State,
    http::{
        header::{ACCEPT_ENCODING, CONTENT_LENGTH, TRANSFER_ENCODING},
        HeaderMap, HeaderValue, Method, Request,
    },
    middleware::Next,
    response::Response,
};

use crate::http::error::ProxyError;
use crate::rewrite::rewrite_group;

/// The group shown to clients.
#[derive(Debug, Clone)]
pub struct VirtualGroup(Arc<str>);

impl VirtualGroup {
    pub fn new(group: impl Into<Arc<str>>) -> Self {
        Self(group.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Methods whose request body is a manifest to rewrite.
pub fn is_body_mutation(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

pub async fn transform_groups(
    State(group): State<VirtualGroup>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ProxyError> {
    request.headers_mut().remove(ACCEPT_ENCODING);

    if is_body_mutation(request.method()) {
        let (mut parts, body) = request.into_parts();
        let body = read_body(body).await?;
        let body = rewrite_group("", &body)?;
        set_length(&mut parts.headers, body.len());
        request = Request::from_parts(parts, Body::from(body));
    }

    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let body = read_body(body).await?;
    let body = rewrite_group(group.as_str(), &body)?;
    set_length(&mut parts.headers, body.len());

    Ok(Response::from_parts(parts, Body::from(body)))
}

/// Collect a whole body into memory.
pub(crate) async fn read_body(body: Body) -> Result<Bytes, ProxyError> {
    to_bytes(body, usize::MAX).await.map_err(ProxyError::Body)
}

pub(crate) fn set_length(headers: &mut HeaderMap, len: usize) {
    headers.remove(TRANSFER_ENCODING);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
}
