//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::rewrite::SYNTHETIC_GROUP;

/// Service account mount used when running inside the cluster.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream API server and how to authenticate to it.
    pub upstream: UpstreamConfig,

    /// Virtual group settings.
    pub rewrite: RewriteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the upstream. Discovered from the environment when unset.
    pub url: Option<String>,

    /// Literal bearer token. Takes precedence over `token_path`.
    pub token: Option<String>,

    /// File holding the bearer token.
    pub token_path: String,

    /// Skip TLS verification of the upstream.
    pub insecure: bool,

    /// CA bundle (PEM) trusted for the upstream when not insecure.
    pub ca_cert_path: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            token_path: format!("{}/token", SERVICE_ACCOUNT_DIR),
            insecure: false,
            ca_cert_path: format!("{}/ca.crt", SERVICE_ACCOUNT_DIR),
        }
    }
}

/// Virtual group routing and rewriting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Group advertised to clients.
    pub group: String,

    /// Native path prefix on the upstream that serves the group's resources.
    pub upstream_prefix: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            group: SYNTHETIC_GROUP.to_string(),
            upstream_prefix: "/oapi".to_string(),
        }
    }
}

impl RewriteConfig {
    /// Client-visible path prefix of the virtual group, e.g. `/apis/openshift.org`.
    pub fn client_prefix(&self) -> String {
        format!("/apis/{}", self.group)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
