//! Request pipeline stages.
//!
//! Each stage is an axum `from_fn` middleware with its own small state, so it
//! can be layered onto any route and tested alone. `server.rs` assembles them
//! per route in a `ServiceBuilder`, outermost first.

pub mod auth;
pub mod discovery;
pub mod logging;
pub mod path;
pub mod transform;

pub use auth::{inject_auth, BearerToken};
pub use discovery::augment_discovery;
pub use logging::log_requests;
pub use path::{rewrite_path, PathRewrite};
pub use transform::{transform_groups, VirtualGroup};
