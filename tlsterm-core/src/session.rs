//! Per-connection server session.
//!
//! [`ServerSession`] owns everything one connection needs: the inbound record
//! buffer, handshake message reassembly, the handshake state machine, the
//! handshake-epoch record protection and the application data channel. The
//! transport feeds it bytes and writes back whatever it returns; records are
//! handled strictly in arrival order.
//!
//! Sessions share nothing but their `Arc<Config>`.

use std::sync::Arc;

use bytes::BytesMut;
use tlsterm_crypto::CryptoProvider;

use crate::application::ApplicationDataChannel;
use crate::error::{Alert, AlertDescription, AlertLevel, Error, Result};
use crate::handshake::{ServerHandshake, ServerState};
use crate::messages::{HandshakeBuffer, HandshakeMessage};
use crate::protocol::{ContentType, HandshakeType};
use crate::record::{RecordReader, TlsRecord};
use crate::record_protection::RecordProtection;
use crate::Config;

/// Result of feeding bytes to a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutput {
    /// Bytes to write to the peer verbatim
    pub outbound: Vec<u8>,

    /// Decrypted application messages, one per record, in order
    pub application_data: Vec<Vec<u8>>,

    /// The client Finished was verified during this call
    pub handshake_complete: bool,

    /// The peer sent close_notify
    pub peer_closed: bool,
}

/// Server side of one TLS 1.3 connection.
pub struct ServerSession {
    config: Arc<Config>,
    reader: RecordReader,
    handshake_buffer: HandshakeBuffer,
    handshake: ServerHandshake,
    handshake_write: Option<RecordProtection>,
    handshake_read: Option<RecordProtection>,
    application: Option<ApplicationDataChannel>,
    peer_closed: bool,
    poisoned: bool,
    fatal_alert_sent: bool,
}

impl std::fmt::Debug for ServerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSession")
            .field("state", &self.handshake.state())
            .field("buffered", &self.reader.buffered())
            .field("peer_closed", &self.peer_closed)
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}

impl ServerSession {
    /// Create a session for a freshly accepted connection.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            reader: RecordReader::new(),
            handshake_buffer: HandshakeBuffer::new(),
            handshake: ServerHandshake::new(),
            handshake_write: None,
            handshake_read: None,
            application: None,
            peer_closed: false,
            poisoned: false,
            fatal_alert_sent: false,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> ServerState {
        self.handshake.state()
    }

    /// Whether application data can flow.
    pub fn is_handshake_complete(&self) -> bool {
        self.application
            .as_ref()
            .is_some_and(ApplicationDataChannel::is_handshake_finished)
    }

    /// Whether application traffic keys currently exist.
    pub fn has_application_keys(&self) -> bool {
        self.application.is_some()
    }

    /// Whether the peer has sent close_notify.
    pub fn is_peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Whether a fatal error has ended the session.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Feed bytes received from the transport.
    ///
    /// Partial records are buffered until the rest arrives. Any error is
    /// fatal: the session is poisoned and the caller should send
    /// [`fatal_alert`](Self::fatal_alert) and close.
    pub fn read_bytes(
        &mut self,
        provider: &dyn CryptoProvider,
        data: &[u8],
    ) -> Result<SessionOutput> {
        if self.poisoned {
            return Err(Error::ProtocolSequence("Session already failed".into()));
        }
        let mut output = SessionOutput {
            peer_closed: self.peer_closed,
            ..SessionOutput::default()
        };
        if self.peer_closed {
            tracing::debug!(len = data.len(), "Ignoring data after close_notify");
            return Ok(output);
        }

        self.reader.push(data);
        let mut outbound = BytesMut::new();
        let result = self.drain_records(provider, &mut output, &mut outbound);
        if let Err(e) = result {
            self.poison();
            return Err(e);
        }
        output.outbound = outbound.to_vec();
        Ok(output)
    }

    /// Seal application data for the peer.
    ///
    /// Payloads above the configured fragment length are split over several
    /// records.
    pub fn send(&mut self, provider: &dyn CryptoProvider, data: &[u8]) -> Result<Vec<u8>> {
        if self.poisoned {
            return Err(Error::ProtocolSequence("Session already failed".into()));
        }
        let max_fragment = self.config.max_fragment_length();
        let channel = self.application.as_mut().ok_or_else(|| {
            Error::ProtocolSequence("Application data before handshake completion".into())
        })?;

        let mut outbound = BytesMut::with_capacity(data.len() + 32);
        for chunk in data.chunks(max_fragment) {
            channel
                .send(provider, ContentType::ApplicationData, chunk)?
                .encode_into(&mut outbound)?;
        }
        Ok(outbound.to_vec())
    }

    /// Encrypted warning-level close_notify under the current write epoch.
    pub fn close_notify(&mut self, provider: &dyn CryptoProvider) -> Result<Vec<u8>> {
        tracing::debug!("Sending close_notify");
        self.seal_alert(provider, Alert::close_notify())
    }

    /// The fatal alert record for `error`, if one should be sent.
    ///
    /// Sealed under the current write epoch: plaintext before ServerHello,
    /// handshake keys during the handshake, application keys after it. A
    /// session produces at most one fatal alert; later calls return `None`.
    pub fn fatal_alert(
        &mut self,
        provider: &dyn CryptoProvider,
        error: &Error,
    ) -> Option<Vec<u8>> {
        if self.fatal_alert_sent {
            tracing::debug!(%error, "Fatal alert already sent");
            return None;
        }
        let description = error.alert()?;
        tracing::debug!(?description, "Sending fatal alert");
        let record = self.seal_alert(provider, Alert::fatal(description)).ok()?;
        self.fatal_alert_sent = true;
        self.poison();
        Some(record)
    }

    fn seal_alert(&mut self, provider: &dyn CryptoProvider, alert: Alert) -> Result<Vec<u8>> {
        let body = alert.encode();
        let record = match (&mut self.application, &mut self.handshake_write) {
            (Some(channel), _) if channel.is_handshake_finished() => {
                channel.send(provider, ContentType::Alert, &body)?
            },
            (_, Some(write)) => write.encrypt(provider, ContentType::Alert, &body)?,
            _ => TlsRecord::new(ContentType::Alert, body.to_vec()),
        };
        record.encode()
    }

    fn poison(&mut self) {
        self.poisoned = true;
        self.handshake.fail();
        self.handshake_buffer.clear();
    }

    fn drain_records(
        &mut self,
        provider: &dyn CryptoProvider,
        output: &mut SessionOutput,
        outbound: &mut BytesMut,
    ) -> Result<()> {
        while !self.peer_closed {
            let Some(record) = self.reader.next_record()? else {
                break;
            };
            tracing::debug!(
                content_type = ?record.content_type,
                length = record.len(),
                "Received record"
            );
            self.process_record(provider, record, output, outbound)?;
        }
        Ok(())
    }

    fn process_record(
        &mut self,
        provider: &dyn CryptoProvider,
        record: TlsRecord,
        output: &mut SessionOutput,
        outbound: &mut BytesMut,
    ) -> Result<()> {
        match record.content_type {
            ContentType::Handshake => self.process_plaintext_handshake(provider, &record, outbound),
            ContentType::ApplicationData => {
                self.process_protected(provider, &record, output, outbound)
            },
            ContentType::Alert => self.process_alert(&record.fragment, output),
            ContentType::ChangeCipherSpec => {
                tracing::debug!("Skipping legacy change_cipher_spec");
                Ok(())
            },
            other => {
                tracing::warn!(content_type = ?other, "Skipping unsupported record type");
                Ok(())
            },
        }
    }

    fn process_plaintext_handshake(
        &mut self,
        provider: &dyn CryptoProvider,
        record: &TlsRecord,
        outbound: &mut BytesMut,
    ) -> Result<()> {
        let awaiting_hello = self.handshake.state() == ServerState::AwaitingClientHello;
        let starts_client_hello =
            record.fragment.first() == Some(&HandshakeType::ClientHello.to_u8());

        if !awaiting_hello {
            if !starts_client_hello {
                return Err(Error::ProtocolSequence(
                    "Plaintext handshake record after ServerHello".into(),
                ));
            }
            self.restart();
        }

        self.handshake_buffer.extend(&record.fragment);
        self.process_handshake_messages(provider, outbound)
    }

    fn process_protected(
        &mut self,
        provider: &dyn CryptoProvider,
        record: &TlsRecord,
        output: &mut SessionOutput,
        outbound: &mut BytesMut,
    ) -> Result<()> {
        match self.handshake.state() {
            ServerState::AwaitingClientFinished => {
                let read = self.handshake_read.as_mut().ok_or_else(|| {
                    Error::InternalError("Handshake read keys missing".into())
                })?;
                let (content_type, content) = read.decrypt(provider, record)?;
                match content_type {
                    ContentType::Handshake => {
                        self.handshake_buffer.extend(&content);
                        self.process_handshake_messages(provider, outbound)?;
                        if self.is_handshake_complete() {
                            output.handshake_complete = true;
                        }
                        Ok(())
                    },
                    ContentType::Alert => self.process_alert(&content, output),
                    other => Err(Error::ProtocolSequence(format!(
                        "{:?} before client Finished",
                        other
                    ))),
                }
            },
            ServerState::AwaitingApplicationTraffic => {
                let channel = self.application.as_mut().ok_or_else(|| {
                    Error::InternalError("Application keys missing".into())
                })?;
                let (content_type, content) = channel.receive(provider, record)?;
                match content_type {
                    ContentType::ApplicationData => {
                        tracing::debug!(len = content.len(), "Application data received");
                        output.application_data.push(content);
                        Ok(())
                    },
                    ContentType::Alert => self.process_alert(&content, output),
                    other => Err(Error::ProtocolSequence(format!(
                        "Post-handshake {:?} not supported",
                        other
                    ))),
                }
            },
            state => Err(Error::ProtocolSequence(format!(
                "Protected record in state {:?}",
                state
            ))),
        }
    }

    fn process_handshake_messages(
        &mut self,
        provider: &dyn CryptoProvider,
        outbound: &mut BytesMut,
    ) -> Result<()> {
        while let Some((message, raw)) = self.handshake_buffer.next_message()? {
            tracing::debug!(message = message.name(), len = raw.len(), "Handshake message");
            match (self.handshake.state(), message) {
                (ServerState::AwaitingClientHello, HandshakeMessage::ClientHello(hello)) => {
                    let flight = self.handshake.process_client_hello(
                        provider,
                        &self.config,
                        &hello,
                        &raw,
                    )?;
                    for record in &flight.records {
                        record.encode_into(outbound)?;
                    }
                    self.handshake_write = Some(flight.handshake_write);
                    self.handshake_read = Some(flight.handshake_read);

                    let artifacts = self.handshake.complete_handshake(provider)?;
                    self.application = Some(ApplicationDataChannel::new(provider, &artifacts)?);
                    self.expect_record_boundary("ClientHello")?;
                },
                (ServerState::AwaitingClientFinished, HandshakeMessage::Finished(finished)) => {
                    self.handshake.process_client_finished(provider, &finished, &raw)?;
                    self.expect_record_boundary("Finished")?;
                    let channel = self.application.as_mut().ok_or_else(|| {
                        Error::InternalError("Application keys missing".into())
                    })?;
                    channel.mark_handshake_finished();
                    self.handshake_read = None;
                    self.handshake_write = None;
                },
                (state, message) => {
                    return Err(Error::ProtocolSequence(format!(
                        "Unexpected {} in state {:?}",
                        message.name(),
                        state
                    )));
                },
            }
        }
        Ok(())
    }

    /// Messages preceding a key change must end at a record boundary.
    fn expect_record_boundary(&self, after: &str) -> Result<()> {
        if self.handshake_buffer.is_empty() {
            Ok(())
        } else {
            Err(Error::ProtocolSequence(format!(
                "Data coalesced after {}",
                after
            )))
        }
    }

    fn process_alert(&mut self, body: &[u8], output: &mut SessionOutput) -> Result<()> {
        let alert = Alert::decode(body)?;
        match (alert.level, alert.description) {
            (_, AlertDescription::CloseNotify) => {
                tracing::info!("Peer sent close_notify");
                self.peer_closed = true;
                output.peer_closed = true;
                Ok(())
            },
            (AlertLevel::Warning, AlertDescription::UserCanceled) => {
                tracing::warn!("Peer sent user_canceled");
                Ok(())
            },
            (level, description) => {
                tracing::warn!(?level, ?description, "Peer sent alert");
                Err(Error::AlertReceived(description))
            },
        }
    }

    /// Drop every key and start over for a new ClientHello.
    fn restart(&mut self) {
        tracing::info!(
            state = ?self.handshake.state(),
            "ClientHello mid-session, restarting handshake"
        );
        self.handshake = ServerHandshake::new();
        self.handshake_buffer.clear();
        self.handshake_write = None;
        self.handshake_read = None;
        self.application = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_PEM: &str = include_str!("../tests/data/server.crt");
    const KEY_PEM: &str = include_str!("../tests/data/server.key");

    fn session() -> ServerSession {
        let config = Config::builder()
            .with_certificate_chain_pem(CERT_PEM)
            .with_private_key_pem(KEY_PEM)
            .build()
            .unwrap();
        ServerSession::new(Arc::new(config))
    }

    #[test]
    fn test_send_before_handshake() {
        let provider = tlsterm_crypto_rustcrypto::RustCryptoProvider::new();
        let mut session = session();
        assert!(matches!(
            session.send(&provider, b"too early"),
            Err(Error::ProtocolSequence(_))
        ));
    }

    #[test]
    fn test_plaintext_alert_before_hello() {
        let provider = tlsterm_crypto_rustcrypto::RustCryptoProvider::new();
        let mut session = session();
        let err = session.read_bytes(&provider, &[21, 3, 3, 0, 2, 2, 40]).unwrap_err();
        assert_eq!(err, Error::AlertReceived(AlertDescription::HandshakeFailure));
        assert!(session.is_poisoned());
        assert!(session.fatal_alert(&provider, &err).is_none());
        assert!(session.read_bytes(&provider, &[]).is_err());
    }

    #[test]
    fn test_close_notify_before_hello() {
        let provider = tlsterm_crypto_rustcrypto::RustCryptoProvider::new();
        let mut session = session();
        let output = session.read_bytes(&provider, &[21, 3, 3, 0, 2, 1, 0]).unwrap();
        assert!(output.peer_closed);
        assert!(session.is_peer_closed());
        // Plaintext before any keys exist
        assert_eq!(session.close_notify(&provider).unwrap(), vec![21, 3, 3, 0, 2, 1, 0]);
    }

    #[test]
    fn test_skips_change_cipher_spec_and_unknown_types() {
        let provider = tlsterm_crypto_rustcrypto::RustCryptoProvider::new();
        let mut session = session();
        let output = session
            .read_bytes(&provider, &[20, 3, 3, 0, 1, 1, 24, 3, 3, 0, 1, 0])
            .unwrap();
        assert_eq!(output, SessionOutput::default());
        assert!(!session.is_poisoned());
    }

    #[test]
    fn test_protected_record_before_hello() {
        let provider = tlsterm_crypto_rustcrypto::RustCryptoProvider::new();
        let mut session = session();
        let mut record = vec![23, 3, 3, 0, 20];
        record.extend_from_slice(&[0u8; 20]);
        let err = session.read_bytes(&provider, &record).unwrap_err();
        assert!(matches!(err, Error::ProtocolSequence(_)));
        assert_eq!(
            session.fatal_alert(&provider, &err).unwrap(),
            vec![21, 3, 3, 0, 2, 2, 10]
        );

        // Later failures on the dead session stay silent
        let again = session.send(&provider, b"late").unwrap_err();
        assert!(again.alert().is_some());
        assert_eq!(session.fatal_alert(&provider, &again), None);
    }

    #[test]
    fn test_fatal_alert_ends_session() {
        let provider = tlsterm_crypto_rustcrypto::RustCryptoProvider::new();
        let mut session = session();
        let err = session.send(&provider, b"too early").unwrap_err();
        assert!(!session.is_poisoned());
        assert_eq!(
            session.fatal_alert(&provider, &err).unwrap(),
            vec![21, 3, 3, 0, 2, 2, 10]
        );
        assert!(session.is_poisoned());
        assert!(session.read_bytes(&provider, &[22, 3, 1]).is_err());
    }

    #[test]
    fn test_partial_record_waits() {
        let provider = tlsterm_crypto_rustcrypto::RustCryptoProvider::new();
        let mut session = session();
        let output = session.read_bytes(&provider, &[22, 3, 1, 0]).unwrap();
        assert!(output.outbound.is_empty());
        assert_eq!(session.state(), ServerState::AwaitingClientHello);
    }
}
