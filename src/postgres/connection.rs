// ABOUTME: TLS-aware PostgreSQL connections with retry on startup
// ABOUTME: The certificate policy is set once per process from the CLI

use anyhow::{Context, Result};
use postgres_native_tls::MakeTlsConnector;
use std::sync::OnceLock;
use std::time::Duration;
use tokio_postgres::Client;

use crate::utils::{retry_with_backoff, sanitize_url};

static ALLOW_SELF_SIGNED: OnceLock<bool> = OnceLock::new();

/// Set the process-wide TLS certificate policy.
///
/// Only the first call has an effect. Without a call, certificates are verified.
pub fn init_tls_policy(allow_self_signed_certs: bool) {
    if ALLOW_SELF_SIGNED.set(allow_self_signed_certs).is_err() {
        tracing::debug!("TLS policy already initialized; ignoring");
    }
}

fn allow_self_signed() -> bool {
    ALLOW_SELF_SIGNED.get().copied().unwrap_or(false)
}

fn make_tls_connector() -> Result<MakeTlsConnector> {
    let allow_invalid = allow_self_signed();
    if allow_invalid {
        tracing::warn!("Accepting invalid TLS certificates (--allow-self-signed-certs)");
    }

    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(allow_invalid)
        .danger_accept_invalid_hostnames(allow_invalid)
        .build()
        .context("Failed to build TLS connector")?;

    Ok(MakeTlsConnector::new(connector))
}

/// Connect to PostgreSQL.
///
/// TLS is negotiated according to the `sslmode` of the URL (default `prefer`).
/// The connection task is spawned on the current tokio runtime.
pub async fn connect(url: &str) -> Result<Client> {
    let tls = make_tls_connector()?;

    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .with_context(|| format!("Failed to connect to {}", sanitize_url(url)))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("PostgreSQL connection error: {}", e);
        }
    });

    Ok(client)
}

/// Connect with exponential backoff (3 retries, starting at 1 second).
pub async fn connect_with_retry(url: &str) -> Result<Client> {
    tracing::info!("Connecting to {}", sanitize_url(url));
    retry_with_backoff(|| connect(url), 3, Duration::from_secs(1)).await
}
