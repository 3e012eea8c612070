//! Shared utilities for route and end-to-end tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, Request, Response, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use url::Url;

use group_proxy::config::{ObservabilityConfig, ResolvedConfig, RewriteConfig};
use group_proxy::http::{HttpServer, Upstream, UpstreamError};
use group_proxy::lifecycle::Shutdown;
use group_proxy::net::UpstreamTls;

pub const TOKEN: &str = "proxy-token";

/// A request as seen by the upstream side.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("upstream body is JSON")
    }

    pub fn authorization(&self) -> Vec<String> {
        self.headers
            .get_all("authorization")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }
}

async fn record(log: &Mutex<Vec<Recorded>>, request: Request<Body>) -> Recorded {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap();
    let recorded = Recorded {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    };
    log.lock().unwrap().push(recorded.clone());
    recorded
}

/// Upstream double that records every request and replies with a fixed response.
pub struct SpyUpstream {
    requests: Arc<Mutex<Vec<Recorded>>>,
    status: StatusCode,
    body: String,
}

impl SpyUpstream {
    pub fn replying(status: StatusCode, body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            status,
            body: body.into(),
        })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn only_request(&self) -> Recorded {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one upstream call");
        requests.into_iter().next().unwrap()
    }
}

impl Upstream for SpyUpstream {
    fn forward(
        &self,
        request: Request<Body>,
    ) -> BoxFuture<'static, Result<Response<Body>, UpstreamError>> {
        let requests = self.requests.clone();
        let status = self.status;
        let body = self.body.clone();
        Box::pin(async move {
            record(&requests, request).await;
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, "application/json".parse().unwrap());
            response.headers_mut().insert("x-upstream", "spy".parse().unwrap());
            Ok(response)
        })
    }
}

/// Upstream double whose transport always fails.
pub struct FailingUpstream;

impl Upstream for FailingUpstream {
    fn forward(
        &self,
        _request: Request<Body>,
    ) -> BoxFuture<'static, Result<Response<Body>, UpstreamError>> {
        Box::pin(async { Err(UpstreamError::Body(axum::Error::new("connection refused"))) })
    }
}

pub fn test_config(upstream_url: &str) -> ResolvedConfig {
    ResolvedConfig {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        metrics_address: None,
        upstream_url: Url::parse(upstream_url).unwrap(),
        token: TOKEN.to_string(),
        tls: UpstreamTls::Insecure,
        rewrite: RewriteConfig::default(),
        observability: ObservabilityConfig::default(),
    }
}

/// Router wired to the given upstream double.
pub fn router_with(upstream: Arc<dyn Upstream>) -> Router {
    HttpServer::new(&test_config("http://upstream.invalid"), upstream)
        .unwrap()
        .router()
}

/// Mock API server listening on an ephemeral port.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock API server that speaks only the ungrouped `/oapi` dialect.
pub async fn start_mock_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new().fallback(mock_api).with_state(requests.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, requests }
}

async fn mock_api(
    State(requests): State<Arc<Mutex<Vec<Recorded>>>>,
    request: Request<Body>,
) -> axum::response::Response {
    let recorded = record(&requests, request).await;
    let path = recorded.uri.path().to_string();

    match (recorded.method.clone(), path.as_str()) {
        (Method::GET, "/apis") => axum::Json(json!({
            "kind": "APIGroupList",
            "apiVersion": "v1",
            "groups": [{
                "name": "apps",
                "versions": [{"groupVersion": "apps/v1", "version": "v1"}],
                "preferredVersion": {"groupVersion": "apps/v1", "version": "v1"}
            }]
        }))
        .into_response(),
        (_, "/healthz") => "ok".into_response(),
        (Method::POST | Method::PUT | Method::PATCH, _) => {
            let mut manifest = recorded.json();
            manifest["metadata"] = json!({});
            (StatusCode::CREATED, axum::Json(manifest)).into_response()
        }
        (Method::DELETE, p) if p.starts_with("/oapi/") => axum::Json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Success"
        }))
        .into_response(),
        (Method::GET, p) if p.starts_with("/oapi/") => axum::Json(json!({
            "kind": "Project",
            "apiVersion": "v1",
            "metadata": {"name": "demo"}
        }))
        .into_response(),
        (Method::GET, p) if p.starts_with("/api/") => axum::Json(json!({
            "kind": "NamespaceList",
            "apiVersion": "v1",
            "items": []
        }))
        .into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({"kind": "Status", "apiVersion": "v1", "code": 404})),
        )
            .into_response(),
    }
}

/// Run the proxy against `upstream_url` on an ephemeral port.
pub async fn start_proxy(upstream_url: &str) -> (SocketAddr, Shutdown) {
    let server = HttpServer::from_config(&test_config(upstream_url)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
