//! TLS 1.3 echo server.
//!
//! Echoes every application message back to the client.
//!
//! # Usage
//!
//! ```bash
//! TLSTERM_CERT=server.crt TLSTERM_KEY=server.key \
//!     cargo run --example echo_server
//! ```
//!
//! `TLSTERM_ADDR` overrides the listen address (default `127.0.0.1:4433`).
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::env;
use std::sync::Arc;

use tlsterm::{Config, CryptoProvider, RustCryptoProvider, TlsAcceptor};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:4433";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn load_config(provider: &dyn CryptoProvider) -> Result<Config, BoxError> {
    let cert_path = env::var("TLSTERM_CERT").map_err(|_| "TLSTERM_CERT is not set")?;
    let key_path = env::var("TLSTERM_KEY").map_err(|_| "TLSTERM_KEY is not set")?;

    let cert_pem = std::fs::read_to_string(&cert_path)?;
    let key_pem = std::fs::read_to_string(&key_path)?;
    Ok(Config::builder()
        .with_certificate_chain_pem(&cert_pem)
        .with_private_key_pem(&key_pem)
        .build_with(provider)?)
}

async fn handle(acceptor: TlsAcceptor, tcp: TcpStream) -> tlsterm::Result<()> {
    let mut tls = acceptor.accept(tcp).await?;
    let mut echoed = 0usize;
    while let Some(message) = tls.read_message().await? {
        echoed += message.len();
        tls.write_message(&message).await?;
    }
    tls.shutdown().await?;
    tracing::info!(echoed, "Connection closed");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = env::var("TLSTERM_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let provider = Arc::new(RustCryptoProvider::new());
    let config = Arc::new(load_config(provider.as_ref())?);
    tracing::info!(?config, "Loaded credentials");

    let acceptor = TlsAcceptor::new(config, provider);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Listening");

    loop {
        let (tcp, peer) = listener.accept().await?;
        let acceptor = acceptor.clone();
        tokio::spawn(async move {
            tracing::debug!(%peer, "Accepted connection");
            if let Err(e) = handle(acceptor, tcp).await {
                tracing::warn!(%peer, error = %e, "Connection failed");
            }
        });
    }
}
