//! Forwarding to the upstream API server.
//!
//! # Responsibilities
//! - Map the incoming request onto the upstream base URL
//! - Strip hop-by-hop headers in both directions
//! - Append the client address to X-Forwarded-For
//! - Stream the upstream response back as an axum body
//!
//! # Design Decisions
//! - `Upstream` is a trait so routes can be exercised against a spy
//! - No retries and no timeouts; failures surface once to the caller
//! - Request bodies are read fully before sending

use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{
        header::{self, HeaderName},
        HeaderMap, HeaderValue, Request, Response, Uri,
    },
};
use futures_util::future::BoxFuture;
use thiserror::Error;
use url::Url;

/// Errors raised while talking to the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Something that can answer a proxied request.
pub trait Upstream: Send + Sync + 'static {
    fn forward(&self, request: Request<Body>)
        -> BoxFuture<'static, Result<Response<Body>, UpstreamError>>;
}

/// Upstream reached over HTTP(S) with a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpUpstream {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join the request's path and query onto the base URL.
    pub fn target_url(&self, uri: &Uri) -> Url {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}{}", base_path, uri.path()));
        url.set_query(uri.query());
        url
    }
}

impl Upstream for HttpUpstream {
    fn forward(
        &self,
        request: Request<Body>,
    ) -> BoxFuture<'static, Result<Response<Body>, UpstreamError>> {
        let client = self.client.clone();
        let url = self.target_url(request.uri());

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let body = to_bytes(body, usize::MAX)
                .await
                .map_err(UpstreamError::Body)?;

            let mut headers = parts.headers;
            strip_hop_by_hop(&mut headers);
            headers.remove(header::HOST);
            if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
                append_forwarded_for(&mut headers, peer);
            }

            tracing::debug!(method = %parts.method, url = %url, "Forwarding to upstream");

            let upstream_response = client
                .request(parts.method, url)
                .headers(headers)
                .body(body)
                .send()
                .await?;

            let status = upstream_response.status();
            let mut response_headers = upstream_response.headers().clone();
            strip_hop_by_hop(&mut response_headers);

            let mut response = Response::new(Body::from_stream(upstream_response.bytes_stream()));
            *response.status_mut() = status;
            *response.headers_mut() = response_headers;
            Ok(response)
        })
    }
}

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove headers that describe a single connection rather than the message.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

fn append_forwarded_for(headers: &mut HeaderMap, peer: &SocketAddr) {
    let ip = peer.ip().to_string();
    let value = match headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, ip),
        None => ip,
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert("x-forwarded-for", value);
    }
}
