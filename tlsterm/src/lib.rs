//! # tlsterm
//!
//! Server-side TLS 1.3 termination for tokio byte streams.
//!
//! One cipher suite (`TLS_AES_256_GCM_SHA384`), one key exchange group
//! (X25519) and one signature scheme (`rsa_pss_rsae_sha256`). No client
//! authentication, resumption, 0-RTT or HelloRetryRequest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn example(cert_pem: &str, key_pem: &str) -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use tlsterm::{Config, CryptoProvider, RustCryptoProvider, TlsAcceptor};
//! use tokio::net::TcpListener;
//!
//! let config = Config::builder()
//!     .with_certificate_chain_pem(cert_pem)
//!     .with_private_key_pem(key_pem)
//!     .build()?;
//! let acceptor = TlsAcceptor::new(Arc::new(config), Arc::new(RustCryptoProvider::new()));
//!
//! let listener = TcpListener::bind("0.0.0.0:4433").await?;
//! let (tcp, _) = listener.accept().await?;
//! let mut tls = acceptor.accept(tcp).await?;
//! while let Some(message) = tls.read_message().await? {
//!     tls.write_message(&message).await?;
//! }
//! tls.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The sans-I/O session underneath lives in [`tlsterm_core`]; embed
//! [`ServerSession`] directly to drive it from another runtime.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export core types
pub use tlsterm_core::{
    self, cipher, protocol, Config, ConfigBuilder, ContentType, ServerSession, SessionOutput,
};

// Re-export crypto interface
pub use tlsterm_crypto::{self, CryptoProvider};
pub use tlsterm_crypto_rustcrypto::RustCryptoProvider;

pub mod error;
pub mod server;
pub mod stream;

pub use error::{Error, Result};
pub use server::TlsAcceptor;
pub use stream::TlsStream;

/// tlsterm version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the tlsterm version.
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert!(ver.starts_with("0."));
    }
}
