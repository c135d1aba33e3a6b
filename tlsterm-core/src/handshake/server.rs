//! TLS 1.3 Server Handshake State Machine (RFC 8446 Section 4).
//!
//! The server processes the ClientHello, generates its whole flight in one
//! step, and then verifies the client's Finished message.
//!
//! # State Transition Diagram
//! ```text
//! AwaitingClientHello
//!   | (receive ClientHello)
//!   v
//! NegotiatingKeys
//!   | (send ServerHello, derive handshake secrets)
//!   v
//! SendingServerCredentials
//!   | (send EncryptedExtensions, Certificate, CertificateVerify, Finished)
//!   v
//! AwaitingClientFinished
//!   | (receive client Finished)
//!   v
//! AwaitingApplicationTraffic
//! ```
//!
//! Any error moves the machine to `Failed`, which accepts nothing.

use crate::cipher::CipherSuite;
use crate::error::{Error, Result};
use crate::extensions::{KeyShareEntry, GROUP_X25519};
use crate::handshake::HandshakeArtifacts;
use crate::key_schedule::KeySchedule;
use crate::messages::*;
use crate::protocol::ContentType;
use crate::record::TlsRecord;
use crate::record_protection::RecordProtection;
use crate::transcript::{compute_verify_data, verify_finished, Transcript};
use crate::Config;
use tlsterm_crypto::{CryptoProvider, KeyExchangeAlgorithm, SignatureAlgorithm};

/// Server handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Initial state, waiting for ClientHello
    AwaitingClientHello,
    /// ClientHello accepted, ServerHello and shared secret in progress
    NegotiatingKeys,
    /// Handshake keys derived, encrypted flight in progress
    SendingServerCredentials,
    /// Server Finished sent, waiting for client Finished
    AwaitingClientFinished,
    /// Handshake complete, ready for application data
    AwaitingApplicationTraffic,
    /// Error state
    Failed,
}

/// Everything the server sends in reply to a ClientHello.
pub struct ServerFlight {
    /// ServerHello in plaintext, then EncryptedExtensions, Certificate,
    /// CertificateVerify and Finished each sealed in its own record
    pub records: Vec<TlsRecord>,

    /// Server handshake write state, positioned after the flight
    pub handshake_write: RecordProtection,

    /// Client handshake read state, for the client Finished
    pub handshake_read: RecordProtection,
}

impl std::fmt::Debug for ServerFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerFlight")
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

/// Server handshake context.
///
/// One instance per connection and per ClientHello. A renegotiating
/// ClientHello gets a fresh instance, never a reset of this one.
pub struct ServerHandshake {
    state: ServerState,
    key_schedule: Option<KeySchedule>,
    transcript: Transcript,
    artifacts_taken: bool,
}

impl std::fmt::Debug for ServerHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandshake")
            .field("state", &self.state)
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

impl Default for ServerHandshake {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerHandshake {
    /// Create a new server handshake state machine.
    pub fn new() -> Self {
        Self {
            state: ServerState::AwaitingClientHello,
            key_schedule: None,
            transcript: Transcript::new(),
            artifacts_taken: false,
        }
    }

    /// Get the current handshake state.
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Check if the client Finished has been verified.
    pub fn is_connected(&self) -> bool {
        self.state == ServerState::AwaitingApplicationTraffic
    }

    /// The running transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Process a ClientHello and produce the complete server flight.
    ///
    /// `raw` is the ClientHello exactly as received, header included; it is
    /// what enters the transcript.
    ///
    /// 1. Validates cipher suite, `supported_versions` and the X25519 key share
    /// 2. Generates the ephemeral key pair and the ServerHello random
    /// 3. Derives the handshake secret and both handshake traffic secrets
    /// 4. Builds, signs and seals EncryptedExtensions, Certificate,
    ///    CertificateVerify and Finished
    pub fn process_client_hello(
        &mut self,
        provider: &dyn CryptoProvider,
        config: &Config,
        client_hello: &ClientHello,
        raw: &[u8],
    ) -> Result<ServerFlight> {
        if self.state != ServerState::AwaitingClientHello {
            return Err(Error::ProtocolSequence(format!(
                "ClientHello in state {:?}",
                self.state
            )));
        }
        let result = self.run_client_hello(provider, config, client_hello, raw);
        if result.is_err() {
            self.state = ServerState::Failed;
        }
        result
    }

    fn run_client_hello(
        &mut self,
        provider: &dyn CryptoProvider,
        config: &Config,
        client_hello: &ClientHello,
        raw: &[u8],
    ) -> Result<ServerFlight> {
        if !client_hello.offers(CipherSuite::Aes256GcmSha384) {
            tracing::warn!(
                offered = ?client_hello.cipher_suites,
                "Client did not offer TLS_AES_256_GCM_SHA384"
            );
            return Err(Error::HandshakeFailure(
                "TLS_AES_256_GCM_SHA384 not offered".into(),
            ));
        }
        if !client_hello.extensions.offers_tls13() {
            return Err(Error::UnsupportedExtension(
                "supported_versions does not list TLS 1.3".into(),
            ));
        }
        let client_share = client_hello
            .extensions
            .client_key_share(GROUP_X25519)
            .ok_or(Error::MissingKeyShare)?;

        self.transcript.add(raw);
        self.state = ServerState::NegotiatingKeys;

        // Random draw order: key pair, ServerHello random, PSS salt.
        let kex = provider.key_exchange(KeyExchangeAlgorithm::X25519)?;
        let (private_key, public_key) = kex.generate_keypair()?;
        let mut tail = [0u8; 28];
        provider.random().fill(&mut tail)?;
        let random = ServerHello::make_random(config.unix_time(), &tail);

        let server_hello = HandshakeMessage::ServerHello(ServerHello::new(
            random,
            client_hello.legacy_session_id.clone(),
            KeyShareEntry::new(GROUP_X25519, public_key.into_bytes()),
        ))
        .encode()?;
        self.transcript.add(&server_hello);

        let shared_secret = kex.exchange(&private_key, &client_share.key_exchange)?;
        let mut key_schedule = KeySchedule::new(provider)?;
        key_schedule.derive_handshake_secret(provider, shared_secret.as_bytes())?;
        key_schedule.derive_handshake_traffic_secrets(provider, self.transcript.bytes())?;
        let mut handshake_write =
            RecordProtection::new(provider, key_schedule.server_handshake_traffic_secret()?)?;
        let handshake_read =
            RecordProtection::new(provider, key_schedule.client_handshake_traffic_secret()?)?;
        tracing::info!(
            session_id_len = client_hello.legacy_session_id.len(),
            "Negotiated TLS 1.3 with X25519"
        );

        self.state = ServerState::SendingServerCredentials;
        let max_fragment = config.max_fragment_length();
        let mut records = plaintext_records(&server_hello, max_fragment);

        let encrypted_extensions =
            HandshakeMessage::EncryptedExtensions(EncryptedExtensions::default()).encode()?;
        self.transcript.add(&encrypted_extensions);
        seal_message(
            provider,
            &mut handshake_write,
            &encrypted_extensions,
            max_fragment,
            &mut records,
        )?;

        let certificate =
            HandshakeMessage::Certificate(Certificate::new(config.certificate_chain().to_vec()))
                .encode()?;
        self.transcript.add(&certificate);
        seal_message(
            provider,
            &mut handshake_write,
            &certificate,
            max_fragment,
            &mut records,
        )?;

        let signed_content =
            CertificateVerify::server_signed_content(&self.transcript.hash(provider)?);
        let signer = provider.signature(SignatureAlgorithm::RsaPssRsaeSha256)?;
        let signature = signer.sign(config.private_key_der(), &signed_content)?;
        let certificate_verify = HandshakeMessage::CertificateVerify(CertificateVerify::new(
            SignatureAlgorithm::RsaPssRsaeSha256,
            signature,
        ))
        .encode()?;
        self.transcript.add(&certificate_verify);
        seal_message(
            provider,
            &mut handshake_write,
            &certificate_verify,
            max_fragment,
            &mut records,
        )?;

        let verify_data = compute_verify_data(
            provider,
            key_schedule.server_handshake_traffic_secret()?,
            &self.transcript.hash(provider)?,
        )?;
        let finished = HandshakeMessage::Finished(Finished::new(verify_data)).encode()?;
        self.transcript.add(&finished);
        seal_message(
            provider,
            &mut handshake_write,
            &finished,
            max_fragment,
            &mut records,
        )?;

        tracing::debug!(records = records.len(), "Server flight ready");
        self.key_schedule = Some(key_schedule);
        self.state = ServerState::AwaitingClientFinished;

        Ok(ServerFlight {
            records,
            handshake_write,
            handshake_read,
        })
    }

    /// Hand over the handshake secret and the transcript through server
    /// Finished. Available once, after the server flight.
    pub fn complete_handshake(
        &mut self,
        provider: &dyn CryptoProvider,
    ) -> Result<HandshakeArtifacts> {
        // The transcript must end at server Finished.
        if self.state != ServerState::AwaitingClientFinished {
            return Err(Error::ProtocolSequence(format!(
                "Handshake artifacts requested in state {:?}",
                self.state
            )));
        }
        if self.artifacts_taken {
            return Err(Error::InternalError("Handshake artifacts already taken".into()));
        }
        let key_schedule = self
            .key_schedule
            .as_ref()
            .ok_or_else(|| Error::InternalError("Key schedule not initialized".into()))?;

        self.artifacts_taken = true;
        Ok(HandshakeArtifacts::new(
            key_schedule.handshake_secret()?.to_vec(),
            self.transcript.bytes().to_vec(),
            self.transcript.hash(provider)?,
        ))
    }

    /// Verify the client Finished against the transcript through server
    /// Finished. A mismatch is a `HandshakeFailure`.
    pub fn process_client_finished(
        &mut self,
        provider: &dyn CryptoProvider,
        finished: &Finished,
        raw: &[u8],
    ) -> Result<()> {
        if self.state != ServerState::AwaitingClientFinished {
            return Err(Error::ProtocolSequence(format!(
                "Client Finished in state {:?}",
                self.state
            )));
        }
        let result = self.run_client_finished(provider, finished, raw);
        if result.is_err() {
            self.state = ServerState::Failed;
        }
        result
    }

    fn run_client_finished(
        &mut self,
        provider: &dyn CryptoProvider,
        finished: &Finished,
        raw: &[u8],
    ) -> Result<()> {
        let key_schedule = self
            .key_schedule
            .as_ref()
            .ok_or_else(|| Error::InternalError("Key schedule not initialized".into()))?;
        let transcript_hash = self.transcript.hash(provider)?;

        if !verify_finished(
            provider,
            key_schedule.client_handshake_traffic_secret()?,
            &transcript_hash,
            &finished.verify_data,
        )? {
            tracing::warn!("Client Finished verify_data mismatch");
            return Err(Error::HandshakeFailure("Client Finished mismatch".into()));
        }

        self.transcript.add(raw);
        self.state = ServerState::AwaitingApplicationTraffic;
        tracing::info!("Handshake complete");
        Ok(())
    }

    /// Mark the machine failed; used by the session when a record-level
    /// error ends the handshake.
    pub fn fail(&mut self) {
        self.state = ServerState::Failed;
    }
}

/// Frame plaintext handshake bytes, split at the fragment limit.
fn plaintext_records(message: &[u8], max_fragment: usize) -> Vec<TlsRecord> {
    message
        .chunks(max_fragment)
        .map(|chunk| TlsRecord::new(ContentType::Handshake, chunk.to_vec()))
        .collect()
}

/// Seal one handshake message, split at the fragment limit.
fn seal_message(
    provider: &dyn CryptoProvider,
    write: &mut RecordProtection,
    message: &[u8],
    max_fragment: usize,
    records: &mut Vec<TlsRecord>,
) -> Result<()> {
    for chunk in message.chunks(max_fragment) {
        records.push(write.encrypt(provider, ContentType::Handshake, chunk)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::{Extension, Extensions};
    use crate::protocol::ProtocolVersion;
    use tlsterm_crypto_rustcrypto::RustCryptoProvider;

    const CERT_PEM: &str = include_str!("../../tests/data/server.crt");
    const KEY_PEM: &str = include_str!("../../tests/data/server.key");

    fn config() -> Config {
        Config::builder()
            .with_certificate_chain_pem(CERT_PEM)
            .with_private_key_pem(KEY_PEM)
            .with_fixed_unix_time(1_600_000_000)
            .build()
            .unwrap()
    }

    fn client_hello(
        provider: &RustCryptoProvider,
        suites: Vec<u16>,
        versions: Vec<u16>,
    ) -> (ClientHello, Vec<u8>) {
        let kex = provider.key_exchange(KeyExchangeAlgorithm::X25519).unwrap();
        let (_, public) = kex.generate_keypair().unwrap();
        let mut extensions = Extensions::new();
        extensions.add(Extension::SupportedVersions(versions));
        extensions.add(Extension::KeyShareClient(vec![KeyShareEntry::new(
            GROUP_X25519,
            public.into_bytes(),
        )]));
        let hello = ClientHello::new([7u8; 32], suites)
            .with_session_id(vec![0xAA; 32])
            .with_extensions(extensions);
        let raw = HandshakeMessage::ClientHello(hello.clone()).encode().unwrap();
        (hello, raw)
    }

    #[test]
    fn test_server_handshake_initial_state() {
        let handshake = ServerHandshake::new();
        assert_eq!(handshake.state(), ServerState::AwaitingClientHello);
        assert!(!handshake.is_connected());
        assert!(handshake.transcript().is_empty());
    }

    #[test]
    fn test_server_flight_shape() {
        let provider = RustCryptoProvider::new();
        let (hello, raw) = client_hello(&provider, vec![0x1301, 0x1302], vec![0x0304]);
        let mut server = ServerHandshake::new();

        let flight = server
            .process_client_hello(&provider, &config(), &hello, &raw)
            .unwrap();
        assert_eq!(server.state(), ServerState::AwaitingClientFinished);
        assert_eq!(flight.records.len(), 5);
        assert_eq!(flight.records[0].content_type, ContentType::Handshake);
        for record in &flight.records[1..] {
            assert_eq!(record.content_type, ContentType::ApplicationData);
            assert_eq!(record.legacy_version, ProtocolVersion::Tls12);
        }
        assert_eq!(flight.handshake_write.sequence_number(), 4);
        assert_eq!(flight.handshake_read.sequence_number(), 0);
        // CH, SH, EE, Certificate, CertificateVerify, Finished
        assert_eq!(server.transcript().message_count(), 6);

        let sh = HandshakeMessage::decode(&flight.records[0].fragment).unwrap();
        match sh {
            HandshakeMessage::ServerHello(sh) => {
                assert_eq!(sh.legacy_session_id_echo, vec![0xAA; 32]);
                assert_eq!(sh.cipher_suite, CipherSuite::Aes256GcmSha384);
                assert_eq!(&sh.random[..4], &1_600_000_000u32.to_be_bytes());
                assert_eq!(sh.extensions.server_key_share().unwrap().key_exchange.len(), 32);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejects_missing_suite_version_and_key_share() {
        let provider = RustCryptoProvider::new();

        let (hello, raw) = client_hello(&provider, vec![0x1301], vec![0x0304]);
        let mut server = ServerHandshake::new();
        assert!(matches!(
            server.process_client_hello(&provider, &config(), &hello, &raw),
            Err(Error::HandshakeFailure(_))
        ));
        assert_eq!(server.state(), ServerState::Failed);

        let (hello, raw) = client_hello(&provider, vec![0x1302], vec![0x0303]);
        let mut server = ServerHandshake::new();
        assert!(matches!(
            server.process_client_hello(&provider, &config(), &hello, &raw),
            Err(Error::UnsupportedExtension(_))
        ));

        let mut hello = ClientHello::new([7u8; 32], vec![0x1302]);
        hello.extensions.add(Extension::SupportedVersions(vec![0x0304]));
        let raw = HandshakeMessage::ClientHello(hello.clone()).encode().unwrap();
        let mut server = ServerHandshake::new();
        assert_eq!(
            server
                .process_client_hello(&provider, &config(), &hello, &raw)
                .err(),
            Some(Error::MissingKeyShare)
        );
    }

    #[test]
    fn test_complete_handshake_once() {
        let provider = RustCryptoProvider::new();
        let mut server = ServerHandshake::new();
        assert!(server.complete_handshake(&provider).is_err());

        let (hello, raw) = client_hello(&provider, vec![0x1302], vec![0x0304]);
        server
            .process_client_hello(&provider, &config(), &hello, &raw)
            .unwrap();

        let artifacts = server.complete_handshake(&provider).unwrap();
        assert_eq!(artifacts.handshake_secret().len(), 48);
        assert_eq!(artifacts.transcript(), server.transcript().bytes());
        assert_eq!(
            artifacts.transcript_hash(),
            server.transcript().hash(&provider).unwrap().as_slice()
        );
        assert!(server.complete_handshake(&provider).is_err());
    }

    #[test]
    fn test_bad_client_finished() {
        let provider = RustCryptoProvider::new();
        let (hello, raw) = client_hello(&provider, vec![0x1302], vec![0x0304]);
        let mut server = ServerHandshake::new();
        server
            .process_client_hello(&provider, &config(), &hello, &raw)
            .unwrap();

        let finished = Finished::new(vec![0u8; 48]);
        let raw_fin = HandshakeMessage::Finished(finished.clone()).encode().unwrap();
        assert!(matches!(
            server.process_client_finished(&provider, &finished, &raw_fin),
            Err(Error::HandshakeFailure(_))
        ));
        assert_eq!(server.state(), ServerState::Failed);
    }

    #[test]
    fn test_second_client_hello_rejected() {
        let provider = RustCryptoProvider::new();
        let (hello, raw) = client_hello(&provider, vec![0x1302], vec![0x0304]);
        let mut server = ServerHandshake::new();
        server
            .process_client_hello(&provider, &config(), &hello, &raw)
            .unwrap();
        assert!(matches!(
            server.process_client_hello(&provider, &config(), &hello, &raw),
            Err(Error::ProtocolSequence(_))
        ));
    }
}
