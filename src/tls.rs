//! TLS configuration with a pinned CA bundle.
//!
//! Builds a [`rustls::ClientConfig`] that trusts only the certificate
//! authorities listed in an operator-supplied PEM file, for deployments
//! where the prediction service sits behind a private CA.

use std::path::Path;

use rustls::ClientConfig;

use crate::Result;

/// Builds a [`ClientConfig`] whose root store contains only the CA
/// certificates found in the PEM file at `path`.
///
/// # Errors
///
/// Returns [`TradexError::Tls`](crate::TradexError::Tls) if the file cannot
/// be read, cannot be parsed, or contains no usable certificate.
pub fn build_tls_config(path: &Path) -> Result<ClientConfig> {
    let pem = std::fs::read(path).map_err(|e| {
        crate::TradexError::Tls(format!("failed to read CA bundle {}: {e}", path.display()))
    })?;

    let mut root_store = rustls::RootCertStore::empty();

    let certs: Vec<_> = rustls_pemfile::certs(&mut &pem[..])
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| crate::TradexError::Tls(format!("failed to parse CA PEM: {e}")))?;

    let (added, _ignored) = root_store.add_parsable_certificates(certs);
    if added == 0 {
        return Err(crate::TradexError::Tls(format!(
            "no usable CA certificates in {}",
            path.display()
        )));
    }

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(config)
}
