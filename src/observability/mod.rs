//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http::middleware::logging
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the edge into every log line
//! - Metrics are cheap (atomic increments) and off unless configured

pub mod logging;
pub mod metrics;
