//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ResolvedConfig.tls
//!     → tls.rs (trust roots or verification disabled)
//!     → reqwest::Client (pooled, shared by every request)
//!     → http::upstream::HttpUpstream
//! ```
//!
//! # Design Decisions
//! - One client for the process lifetime; built before the listener binds
//! - A configured CA bundle replaces the system roots

pub mod tls;

pub use tls::{build_upstream_client, UpstreamTls};
