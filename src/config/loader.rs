//! Configuration loading from disk and the hosting environment.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use crate::config::schema::{ObservabilityConfig, ProxyConfig, RewriteConfig};
use crate::config::validation::{check_upstream_url, validate_config, ValidationError};
use crate::net::tls::UpstreamTls;

/// Environment variable naming the upstream host inside the cluster.
pub const HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
/// Environment variable naming the upstream port inside the cluster.
pub const PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("{0} not found in environment")]
    MissingEnv(&'static str),

    #[error("Invalid upstream: {0}")]
    InvalidUpstream(String),

    #[error("TLS error: {0}")]
    Tls(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Configuration with every external input loaded and checked.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub bind_address: SocketAddr,
    /// Prometheus listener, present only when metrics are enabled.
    pub metrics_address: Option<SocketAddr>,
    pub upstream_url: Url,
    pub token: String,
    pub tls: UpstreamTls,
    pub rewrite: RewriteConfig,
    pub observability: ObservabilityConfig,
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = read_file(path)?;
    let content = String::from_utf8(content).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    let config: ProxyConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the upstream, credential and trust roots using the process environment.
pub fn resolve(config: ProxyConfig) -> Result<ResolvedConfig, ConfigError> {
    resolve_with_env(config, |key| std::env::var(key).ok())
}

/// Resolve with an injectable environment lookup.
pub fn resolve_with_env<F>(config: ProxyConfig, env: F) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    validate_config(&config).map_err(ConfigError::Validation)?;

    let bind_address = parse_address("listener.bind_address", &config.listener.bind_address)?;
    let metrics_address = if config.observability.metrics_enabled {
        Some(parse_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
        )?)
    } else {
        None
    };

    let upstream_url = match &config.upstream.url {
        Some(url) => check_upstream_url(url).map_err(ConfigError::InvalidUpstream)?,
        None => discover_upstream(&env)?,
    };

    let token = match &config.upstream.token {
        Some(token) => token.trim().to_string(),
        None => {
            let raw = read_file(Path::new(&config.upstream.token_path))?;
            String::from_utf8_lossy(&raw).trim().to_string()
        }
    };
    if token.is_empty() {
        return Err(ConfigError::Validation(vec![ValidationError {
            field: "upstream.token",
            message: "credential is empty".to_string(),
        }]));
    }

    let tls = if config.upstream.insecure {
        UpstreamTls::Insecure
    } else {
        UpstreamTls::CaBundle(read_file(Path::new(&config.upstream.ca_cert_path))?)
    };

    Ok(ResolvedConfig {
        bind_address,
        metrics_address,
        upstream_url,
        token,
        tls,
        rewrite: config.rewrite,
        observability: config.observability,
    })
}

fn discover_upstream<F>(env: &F) -> Result<Url, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = env(HOST_ENV)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingEnv(HOST_ENV))?;
    let port = env(PORT_ENV)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingEnv(PORT_ENV))?;

    let url = if host.contains(':') {
        format!("https://[{}]:{}", host, port)
    } else {
        format!("https://{}:{}", host, port)
    };
    check_upstream_url(&url).map_err(ConfigError::InvalidUpstream)
}

fn parse_address(field: &'static str, raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.parse().map_err(|_| {
        ConfigError::Validation(vec![ValidationError {
            field,
            message: format!("not a socket address: {}", raw),
        }])
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
