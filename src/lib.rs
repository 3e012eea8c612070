//! Reverse proxy that serves a virtual API group in front of an API server.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rewrite;

pub use config::{ProxyConfig, ResolvedConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
