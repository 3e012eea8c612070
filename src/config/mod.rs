//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (loader.rs)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → loader::resolve (environment, credential file, CA bundle)
//!     → ResolvedConfig (immutable)
//!     → shared via Arc to all middleware
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; credential rotation needs a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Any resolution failure is fatal before the listener is bound

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, ResolvedConfig};
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ProxyConfig;
pub use schema::RewriteConfig;
pub use schema::UpstreamConfig;
