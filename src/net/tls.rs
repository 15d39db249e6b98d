//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load TLS configuration from PEM certificate and key files.
///
/// The files are checked up front so a bad path or an empty PEM fails
/// startup with a message naming the file.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, io::Error> {
    let cert_count = count_certs(cert_path)?;
    if cert_count == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No certificates found in {:?}", cert_path),
        ));
    }
    check_private_key(key_path)?;

    tracing::info!(cert_path = ?cert_path, certificates = cert_count, "Loading TLS configuration");
    RustlsConfig::from_pem_file(cert_path, key_path).await
}

fn open(path: &Path) -> Result<BufReader<File>, io::Error> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| io::Error::new(e.kind(), format!("{:?}: {}", path, e)))
}

fn count_certs(path: &Path) -> Result<usize, io::Error> {
    let mut reader = open(path)?;
    let mut count = 0;
    for cert in rustls_pemfile::certs(&mut reader) {
        cert?;
        count += 1;
    }
    Ok(count)
}

fn check_private_key(path: &Path) -> Result<(), io::Error> {
    let mut reader = open(path)?;
    match rustls_pemfile::private_key(&mut reader)? {
        Some(_) => Ok(()),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No private key found in {:?}", path),
        )),
    }
}
