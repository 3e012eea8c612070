//! Per-request errors and their wire representation.
//!
//! Every failure inside the rewrite stages becomes the same envelope:
//! `500`, `Content-Type: application/json`, `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::rewrite::RewriteError;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Request or response body could not be rewritten.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// A body could not be read into memory.
    #[error("failed to read body: {0}")]
    Body(#[source] axum::Error),

    /// The rewritten request target is not a valid URI.
    #[error("invalid request path: {0}")]
    InvalidPath(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Request failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, &self.to_string())
    }
}

/// JSON error envelope with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::Value;

    #[tokio::test]
    async fn test_envelope_shape() {
        let err = ProxyError::Rewrite(RewriteError::GroupFormat("bad \"value\"".into()));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"error": "group format error: bad \"value\""}));
    }
}
