//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request IDs, route table)
//!     → middleware/ (logging → auth → path → transform | discovery)
//!     → upstream.rs (forward over TLS to the API server)
//!     → middleware/ (buffer + rewrite response where the route asks for it)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod server;
pub mod upstream;

pub use error::ProxyError;
pub use server::{AppState, HttpServer};
pub use upstream::{HttpUpstream, Upstream, UpstreamError};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";
