//! Server-side acceptor.

use std::sync::Arc;

use tlsterm_core::{Config, ServerSession};
use tlsterm_crypto::CryptoProvider;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::stream::TlsStream;

/// Accepts TLS 1.3 connections over any tokio byte stream.
///
/// Cheap to clone; every accepted connection gets its own [`ServerSession`]
/// and shares only the configuration and the crypto provider.
///
/// # Example
///
/// ```rust,ignore
/// let acceptor = TlsAcceptor::new(config, Arc::new(RustCryptoProvider::new()));
/// let (tcp, _) = listener.accept().await?;
/// let mut tls = acceptor.accept(tcp).await?;
/// while let Some(message) = tls.read_message().await? {
///     tls.write_message(&message).await?;
/// }
/// ```
#[derive(Clone)]
pub struct TlsAcceptor {
    config: Arc<Config>,
    provider: Arc<dyn CryptoProvider>,
}

impl std::fmt::Debug for TlsAcceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsAcceptor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TlsAcceptor {
    /// Create an acceptor.
    pub fn new(config: Arc<Config>, provider: Arc<dyn CryptoProvider>) -> Self {
        Self { config, provider }
    }

    /// Shared server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Run the handshake on `stream`.
    ///
    /// Returns once the client Finished has been verified. On a fatal error
    /// the alert is written before the error is returned.
    pub async fn accept<S>(&self, stream: S) -> Result<TlsStream<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let session = ServerSession::new(self.config.clone());
        let mut tls = TlsStream::new(stream, session, self.provider.clone());
        tls.handshake().await?;
        tracing::info!("TLS handshake complete");
        Ok(tls)
    }
}
