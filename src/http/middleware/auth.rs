//! Upstream credential injection.
//!
//! Every request leaving through the proxy carries the proxy's own bearer
//! token. Whatever the client sent in `Authorization` is replaced.

use std::fmt;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, header::InvalidHeaderValue, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Pre-rendered `Authorization: Bearer <token>` value.
#[derive(Clone)]
pub struct BearerToken(HeaderValue);

impl BearerToken {
    pub fn new(token: &str) -> Result<Self, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        Ok(Self(value))
    }

    pub fn header_value(&self) -> &HeaderValue {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

pub async fn inject_auth(
    State(token): State<BearerToken>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request
        .headers_mut()
        .insert(AUTHORIZATION, token.header_value().clone());
    next.run(request).await
}
