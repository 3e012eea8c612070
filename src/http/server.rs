//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the route table
//! - Assemble each route's middleware pipeline
//! - Wire up request IDs
//! - Bind server to listener with graceful shutdown
//! - Forward requests to the upstream API server
//!
//! # Route Table
//! ```text
//! /apis/<group>       301 → /apis/<group>/
//! /apis/<group>/...   log → auth → path → transform → upstream
//! /apis               log → auth → discovery → upstream      (GET only)
//! /healthz            auth → upstream
//! /...                log → auth → upstream
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::LOCATION, HeaderValue, Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::config::validation::ValidationError;
use crate::config::{ConfigError, ResolvedConfig};
use crate::http::middleware::{
    augment_discovery, inject_auth, log_requests, rewrite_path, transform_groups, BearerToken,
    PathRewrite, VirtualGroup,
};
use crate::http::upstream::{HttpUpstream, Upstream};
use crate::net::tls::build_upstream_client;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn Upstream>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that forwards to the configured upstream over HTTP(S).
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, ConfigError> {
        let client = build_upstream_client(&config.tls)?;
        let upstream = HttpUpstream::new(client, config.upstream_url.clone());
        Self::new(config, Arc::new(upstream))
    }

    /// Create a server that forwards to the given upstream.
    pub fn new(config: &ResolvedConfig, upstream: Arc<dyn Upstream>) -> Result<Self, ConfigError> {
        let token = BearerToken::new(&config.token).map_err(|_| {
            ConfigError::Validation(vec![ValidationError {
                field: "upstream.token",
                message: "credential is not a valid header value".to_string(),
            }])
        })?;
        let client_prefix = config.rewrite.client_prefix();
        let paths = PathRewrite::new(client_prefix.as_str(), config.rewrite.upstream_prefix.as_str());
        let group = VirtualGroup::new(config.rewrite.group.as_str());

        let router = Self::build_router(AppState { upstream }, &client_prefix, token, paths, group);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        state: AppState,
        client_prefix: &str,
        token: BearerToken,
        paths: PathRewrite,
        group: VirtualGroup,
    ) -> Router {
        let virtual_group = ServiceBuilder::new()
            .layer(middleware::from_fn(log_requests))
            .layer(middleware::from_fn_with_state(token.clone(), inject_auth))
            .layer(middleware::from_fn_with_state(paths, rewrite_path))
            .layer(middleware::from_fn_with_state(group.clone(), transform_groups));

        let discovery = ServiceBuilder::new()
            .layer(middleware::from_fn(log_requests))
            .layer(middleware::from_fn_with_state(token.clone(), inject_auth))
            .layer(middleware::from_fn_with_state(group, augment_discovery));

        let health = ServiceBuilder::new()
            .layer(middleware::from_fn_with_state(token.clone(), inject_auth));

        let passthrough = ServiceBuilder::new()
            .layer(middleware::from_fn(log_requests))
            .layer(middleware::from_fn_with_state(token, inject_auth));

        Router::new()
            .route(client_prefix, any(redirect_to_slash))
            .route(
                &format!("{}/", client_prefix),
                any(proxy_handler).layer(virtual_group.clone()),
            )
            .route(
                &format!("{}/{{*path}}", client_prefix),
                any(proxy_handler).layer(virtual_group),
            )
            .route("/apis", any(proxy_handler).layer(discovery))
            .route("/healthz", any(proxy_handler).layer(health))
            .route("/", any(proxy_handler).layer(passthrough.clone()))
            .route("/{*path}", any(proxy_handler).layer(passthrough))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The assembled router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Send the bare group path to its slash form, keeping the query.
async fn redirect_to_slash(uri: Uri) -> Response {
    let mut target = format!("{}/", uri.path());
    if let Some(query) = uri.query() {
        target.push('?');
        target.push_str(query);
    }
    match HeaderValue::try_from(target) {
        Ok(location) => (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Innermost handler: hand the (possibly rewritten) request to the upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match state.upstream.forward(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
