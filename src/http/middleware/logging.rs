//! Request logging.
//!
//! Logs method, path and the status of the response actually produced by the
//! inner stack, then records request metrics. Request and response pass
//! through untouched.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::X_REQUEST_ID;
use crate::observability::metrics;

pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = next.run(request).await;
    let status = response.status().as_u16();

    tracing::info!(
        request_id = %request_id,
        latency_ms = start.elapsed().as_millis() as u64,
        "{} {} {}",
        method,
        path,
        status
    );
    metrics::record_request(method.as_str(), status, &route, start);

    response
}
