//! Application data channel.
//!
//! Created once per handshake from the [`HandshakeArtifacts`] the handshake
//! state machine returns. Holds the application-epoch keys of both directions
//! with independent sequence counters.
//!
//! ```text
//! Derive-Secret(handshake_secret, "derived", "")
//!        |
//!        v
//! 0 -> HKDF-Extract = master_secret
//!        +-> Derive-Secret(., "c ap traffic", CH..server Finished) -> receive keys
//!        +-> Derive-Secret(., "s ap traffic", CH..server Finished) -> send keys
//! ```

use crate::error::{Error, Result};
use crate::handshake::HandshakeArtifacts;
use crate::key_schedule;
use crate::protocol::ContentType;
use crate::record::TlsRecord;
use crate::record_protection::RecordProtection;
use tlsterm_crypto::CryptoProvider;

/// Post-handshake record protection for both directions.
///
/// Nothing is decrypted or sealed until [`mark_handshake_finished`] is called;
/// the session does that only after the client's Finished has verified.
///
/// [`mark_handshake_finished`]: ApplicationDataChannel::mark_handshake_finished
pub struct ApplicationDataChannel {
    receive: RecordProtection,
    send: RecordProtection,
    handshake_finished: bool,
}

impl std::fmt::Debug for ApplicationDataChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationDataChannel")
            .field("receive_sequence", &self.receive.sequence_number())
            .field("send_sequence", &self.send.sequence_number())
            .field("handshake_finished", &self.handshake_finished)
            .finish()
    }
}

impl ApplicationDataChannel {
    /// Derive the master secret and both application traffic secrets.
    pub fn new(provider: &dyn CryptoProvider, artifacts: &HandshakeArtifacts) -> Result<Self> {
        let master_secret = key_schedule::derive_master_secret(provider, artifacts.handshake_secret())?;
        let client_secret = zeroize::Zeroizing::new(key_schedule::derive_secret(
            provider,
            &master_secret,
            b"c ap traffic",
            artifacts.transcript(),
        )?);
        let server_secret = zeroize::Zeroizing::new(key_schedule::derive_secret(
            provider,
            &master_secret,
            b"s ap traffic",
            artifacts.transcript(),
        )?);

        tracing::debug!("Derived application traffic keys");
        Ok(Self {
            receive: RecordProtection::new(provider, &client_secret)?,
            send: RecordProtection::new(provider, &server_secret)?,
            handshake_finished: false,
        })
    }

    /// Open the gate. Called once the client Finished has been verified.
    pub fn mark_handshake_finished(&mut self) {
        self.handshake_finished = true;
    }

    /// Whether the gate is open.
    pub fn is_handshake_finished(&self) -> bool {
        self.handshake_finished
    }

    /// Decrypt a record from the client under the client application keys.
    ///
    /// Returns the inner content type so alerts can be told apart from data.
    pub fn receive(
        &mut self,
        provider: &dyn CryptoProvider,
        record: &TlsRecord,
    ) -> Result<(ContentType, Vec<u8>)> {
        if !self.handshake_finished {
            return Err(Error::ProtocolSequence(
                "Application data before handshake completion".into(),
            ));
        }
        self.receive.decrypt(provider, record)
    }

    /// Seal application data (or an alert) under the server application keys.
    pub fn send(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        data: &[u8],
    ) -> Result<TlsRecord> {
        if !self.handshake_finished {
            return Err(Error::ProtocolSequence(
                "Application data before handshake completion".into(),
            ));
        }
        self.send.encrypt(provider, content_type, data)
    }

    /// Next receive-direction sequence number.
    pub fn receive_sequence(&self) -> u64 {
        self.receive.sequence_number()
    }

    /// Next send-direction sequence number.
    pub fn send_sequence(&self) -> u64 {
        self.send.sequence_number()
    }
}
