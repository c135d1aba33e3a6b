//! Async TLS stream.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use tlsterm_core::{ServerSession, SessionOutput};
use tlsterm_crypto::CryptoProvider;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

const READ_BUFFER_SIZE: usize = 16 * 1024 + 256 + 5;

/// A TLS session bound to a transport stream.
///
/// Messages are record-oriented: each [`read_message`](Self::read_message)
/// returns the plaintext of one application data record.
pub struct TlsStream<S> {
    inner: S,
    session: ServerSession,
    provider: Arc<dyn CryptoProvider>,
    received: VecDeque<Vec<u8>>,
    read_buf: Box<[u8]>,
    eof: bool,
    close_sent: bool,
}

impl<S> std::fmt::Debug for TlsStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsStream")
            .field("session", &self.session)
            .field("queued", &self.received.len())
            .field("eof", &self.eof)
            .field("close_sent", &self.close_sent)
            .finish_non_exhaustive()
    }
}

impl<S> TlsStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(inner: S, session: ServerSession, provider: Arc<dyn CryptoProvider>) -> Self {
        Self {
            inner,
            session,
            provider,
            received: VecDeque::new(),
            read_buf: vec![0u8; READ_BUFFER_SIZE].into_boxed_slice(),
            eof: false,
            close_sent: false,
        }
    }

    /// The underlying transport.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// The session driving this stream.
    pub fn session(&self) -> &ServerSession {
        &self.session
    }

    /// Next application message, or `None` once the peer has closed.
    pub async fn read_message(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(message) = self.received.pop_front() {
                return Ok(Some(message));
            }
            if self.eof || self.session.is_peer_closed() {
                return Ok(None);
            }
            self.read_once().await?;
        }
    }

    /// Seal `data` and write it out.
    pub async fn write_message(&mut self, data: &[u8]) -> Result<()> {
        let sealed = match self.session.send(self.provider.as_ref(), data) {
            Ok(sealed) => sealed,
            Err(e) => return Err(self.abort(e).await),
        };
        self.inner.write_all(&sealed).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Send close_notify and shut down the write side.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.close_sent {
            let alert = self.session.close_notify(self.provider.as_ref())?;
            self.close_sent = true;
            self.inner.write_all(&alert).await?;
        }
        self.inner.shutdown().await?;
        Ok(())
    }

    pub(crate) async fn handshake(&mut self) -> Result<()> {
        while !self.session.is_handshake_complete() {
            if self.eof || self.session.is_peer_closed() {
                tracing::warn!(state = ?self.session.state(), "Peer left during handshake");
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed during handshake",
                )));
            }
            self.read_once().await?;
        }
        Ok(())
    }

    /// One transport read fed through the session.
    async fn read_once(&mut self) -> Result<()> {
        let n = self.inner.read(&mut self.read_buf).await?;
        if n == 0 {
            tracing::debug!("Transport reached EOF");
            self.eof = true;
            return Ok(());
        }

        let output = match self
            .session
            .read_bytes(self.provider.as_ref(), &self.read_buf[..n])
        {
            Ok(output) => output,
            Err(e) => return Err(self.abort(e).await),
        };
        self.deliver(output).await
    }

    async fn deliver(&mut self, output: SessionOutput) -> Result<()> {
        if !output.outbound.is_empty() {
            self.inner.write_all(&output.outbound).await?;
            self.inner.flush().await?;
        }
        self.received.extend(output.application_data);
        Ok(())
    }

    /// Best-effort fatal alert, then hand the error back.
    async fn abort(&mut self, error: tlsterm_core::Error) -> Error {
        tracing::error!(%error, state = ?self.session.state(), "Fatal TLS error");
        if let Some(alert) = self.session.fatal_alert(self.provider.as_ref(), &error) {
            if let Err(e) = self.inner.write_all(&alert).await {
                tracing::debug!(%e, "Could not deliver alert");
            }
            if let Err(e) = self.inner.flush().await {
                tracing::debug!(%e, "Could not flush alert");
            }
        }
        Error::Tls(error)
    }
}
