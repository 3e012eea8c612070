//! Body rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Mutating request body (client → upstream)
//!     → codec.rs (apiVersion "openshift.org/v1" → "v1")
//!
//! Response body (upstream → client)
//!     → codec.rs (apiVersion "v1" → "openshift.org/v1")
//!
//! Discovery response (GET /apis)
//!     → discovery.rs (append the synthetic group to APIGroupList)
//! ```
//!
//! # Design Decisions
//! - Pure functions over byte slices; HTTP concerns live in `http::middleware`
//! - Whole documents only; no streaming decode
//! - Only the top-level `apiVersion` is touched

pub mod codec;
pub mod discovery;
pub mod group_version;

pub use codec::rewrite_group;
pub use discovery::add_synthetic_group;
pub use group_version::GroupVersion;

use thiserror::Error;

/// Group advertised to clients but unknown to the upstream.
pub const SYNTHETIC_GROUP: &str = "openshift.org";

/// Errors produced while rewriting a body.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// Body is not valid JSON (or not the expected shape).
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Body is valid JSON but not an object.
    #[error("decode error: expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// `apiVersion` is present but not a valid group-version string.
    #[error("group format error: {0}")]
    GroupFormat(String),

    /// Re-encoding failed.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
}
