//! group-proxy
//!
//! Serves the virtual `openshift.org` API group on top of an API server that
//! only knows the ungrouped `/oapi` resources.
//!
//! ```text
//!     client ──▶ /apis/openshift.org/v1/... ──▶ proxy ──▶ /oapi/v1/...  ──▶ upstream
//!            ◀── apiVersion: openshift.org/v1 ◀──     ◀── apiVersion: v1 ◀──
//!
//!     client ──▶ GET /apis ──▶ proxy ──▶ upstream APIGroupList + openshift.org
//!     client ──▶ anything else ──▶ proxy (bearer token added) ──▶ upstream
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use group_proxy::config::loader::{load_config, resolve};
use group_proxy::config::ProxyConfig;
use group_proxy::http::HttpServer;
use group_proxy::lifecycle::{signals, Shutdown};
use group_proxy::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "group-proxy")]
#[command(about = "Serve a virtual API group in front of an API server", long_about = None)]
#[command(after_help = "The single-dash forms -insecure and -cacert are also accepted.")]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port number to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Auth token (read from the service account when omitted)
    #[arg(short, long)]
    token: Option<String>,

    /// Skip TLS checks against the upstream
    #[arg(long)]
    insecure: bool,

    /// CA bundle trusted for the upstream
    #[arg(long)]
    cacert: Option<String>,

    /// Upstream base URL (discovered from the environment when omitted)
    #[arg(long)]
    upstream: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut ProxyConfig) {
        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{}", port);
        }
        if let Some(token) = self.token {
            config.upstream.token = Some(token);
        }
        if self.insecure {
            config.upstream.insecure = true;
        }
        if let Some(path) = self.cacert {
            config.upstream.ca_cert_path = path;
        }
        if let Some(url) = self.upstream {
            config.upstream.url = Some(url);
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
    }
}

/// Long flags that deployments pass with a single dash.
const SINGLE_DASH_FLAGS: [&str; 2] = ["insecure", "cacert"];

/// Flags whose next argument is their value.
const VALUE_FLAGS: [&str; 10] = [
    "-c", "--config", "-p", "--port", "-t", "--token", "--cacert", "--upstream", "--log-level",
    "-cacert",
];

/// Rewrite `-insecure` and `-cacert[=PATH]` to their double-dash forms.
///
/// Flag values and everything after `--` are left alone.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut normalized = Vec::new();
    let mut value_expected = false;
    let mut positional = false;

    for arg in args {
        let text = arg.to_str().map(str::to_string);
        if positional || value_expected {
            value_expected = false;
            normalized.push(arg);
            continue;
        }
        let Some(text) = text else {
            normalized.push(arg);
            continue;
        };
        if text == "--" {
            positional = true;
            normalized.push(arg);
            continue;
        }

        value_expected = VALUE_FLAGS.contains(&text.as_str());
        let single_dash = text
            .strip_prefix('-')
            .filter(|flag| SINGLE_DASH_FLAGS.contains(&flag.split('=').next().unwrap_or_default()));
        match single_dash {
            Some(flag) => normalized.push(OsString::from(format!("--{}", flag))),
            None => normalized.push(arg),
        }
    }
    normalized
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);

    logging::init_logging(&config.observability.log_level);
    tracing::info!("group-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let config = resolve(config).map_err(|e| {
        tracing::error!(error = %e, "Configuration rejected");
        e
    })?;

    if let Some(addr) = config.metrics_address {
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::from_config(&config)?;

    let listener = TcpListener::bind(config.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(upstream = %config.upstream_url, "Proxying requests to upstream");
    tracing::info!(
        address = %local_addr,
        group = %config.rewrite.group,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
