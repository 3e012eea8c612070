//! TLS trust configuration for the upstream connection.

use std::fmt;
use std::io::BufReader;

use reqwest::redirect::Policy as RedirectPolicy;
use reqwest::{Certificate, Client};

use crate::config::ConfigError;

/// How the upstream's certificate is verified.
#[derive(Clone)]
pub enum UpstreamTls {
    /// Accept any certificate.
    Insecure,
    /// Trust only the certificates in this PEM bundle.
    CaBundle(Vec<u8>),
}

impl fmt::Debug for UpstreamTls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamTls::Insecure => f.write_str("Insecure"),
            UpstreamTls::CaBundle(pem) => write!(f, "CaBundle({} bytes)", pem.len()),
        }
    }
}

/// Build the pooled HTTP client used to reach the upstream.
///
/// Redirects are handed back to the caller untouched.
pub fn build_upstream_client(tls: &UpstreamTls) -> Result<Client, ConfigError> {
    let mut builder = Client::builder().redirect(RedirectPolicy::none());

    builder = match tls {
        UpstreamTls::Insecure => {
            tracing::warn!("Upstream TLS verification disabled");
            builder.danger_accept_invalid_certs(true)
        }
        UpstreamTls::CaBundle(pem) => {
            builder = builder.tls_built_in_root_certs(false);
            for cert in parse_ca_bundle(pem)? {
                builder = builder.add_root_certificate(cert);
            }
            builder
        }
    };

    builder
        .build()
        .map_err(|e| ConfigError::Tls(format!("failed to build HTTP client: {}", e)))
}

/// Split a PEM bundle into certificates; non-certificate sections are skipped.
fn parse_ca_bundle(pem: &[u8]) -> Result<Vec<Certificate>, ConfigError> {
    let mut reader = BufReader::new(pem);
    let mut certs = Vec::new();
    for der in rustls_pemfile::certs(&mut reader) {
        let der = der.map_err(|e| ConfigError::Tls(format!("invalid PEM CA bundle: {}", e)))?;
        let cert = Certificate::from_der(der.as_ref())
            .map_err(|e| ConfigError::Tls(format!("invalid CA certificate: {}", e)))?;
        certs.push(cert);
    }
    if certs.is_empty() {
        return Err(ConfigError::Tls("CA bundle contains no certificates".into()));
    }
    Ok(certs)
}
