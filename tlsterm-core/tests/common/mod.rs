//! Shared fixtures: credentials, scripted randomness and a minimal client.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tlsterm_core::extensions::{Extension, Extensions, KeyShareEntry, GROUP_X25519};
use tlsterm_core::key_schedule::{self, KeySchedule};
use tlsterm_core::messages::{ClientHello, Finished, HandshakeBuffer, HandshakeMessage};
use tlsterm_core::record::{split_records, TlsRecord};
use tlsterm_core::record_protection::RecordProtection;
use tlsterm_core::transcript::{compute_verify_data, Transcript};
use tlsterm_core::{Config, ContentType};
use tlsterm_crypto::key_exchange::PrivateKey;
use tlsterm_crypto::{CryptoProvider, Error, KeyExchangeAlgorithm, Random, Result};
use tlsterm_crypto_rustcrypto::RustCryptoProvider;

pub const CERT_PEM: &str = include_str!("../data/server.crt");
pub const KEY_PEM: &str = include_str!("../data/server.key");
pub const PKCS1_KEY_PEM: &str = include_str!("../data/server-pkcs1.key");

pub const FIXED_UNIX_TIME: u32 = 1_600_000_000;

/// Hands out a fixed byte sequence, failing once it is exhausted.
pub struct ScriptedRandom(Mutex<Vec<u8>>);

impl ScriptedRandom {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Mutex::new(bytes))
    }

    pub fn remaining(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl Random for ScriptedRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        let mut pool = self.0.lock().unwrap();
        if pool.len() < dest.len() {
            return Err(Error::RandomGenerationFailed);
        }
        let rest = pool.split_off(dest.len());
        dest.copy_from_slice(&pool);
        *pool = rest;
        Ok(())
    }
}

/// Server X25519 private key, ServerHello random tail, PSS salt.
pub fn scripted_server_random() -> Arc<ScriptedRandom> {
    let mut bytes: Vec<u8> = (0x40..0x60).collect();
    bytes.extend(0x01..0x1d);
    bytes.extend(0xc0..0xe0);
    Arc::new(ScriptedRandom::new(bytes))
}

pub fn config() -> Arc<Config> {
    Arc::new(
        Config::builder()
            .with_certificate_chain_pem(CERT_PEM)
            .with_private_key_pem(KEY_PEM)
            .with_fixed_unix_time(FIXED_UNIX_TIME)
            .build()
            .unwrap(),
    )
}

pub fn config_with_fragment(max_fragment: usize) -> Arc<Config> {
    Arc::new(
        Config::builder()
            .with_certificate_chain_pem(CERT_PEM)
            .with_private_key_pem(KEY_PEM)
            .with_max_fragment_length(max_fragment)
            .build()
            .unwrap(),
    )
}

/// Minimal TLS 1.3 client, enough to drive a server session in tests.
pub struct TestClient {
    provider: RustCryptoProvider,
    private_key: PrivateKey,
    public_key: Vec<u8>,
    transcript: Transcript,
    handshake_read: Option<RecordProtection>,
    handshake_write: Option<RecordProtection>,
    client_handshake_secret: Vec<u8>,
    server_handshake_secret: Vec<u8>,
    handshake_secret: Vec<u8>,
    pub app_read: Option<RecordProtection>,
    pub app_write: Option<RecordProtection>,
    pub server_messages: Vec<HandshakeMessage>,
}

impl TestClient {
    pub fn new() -> Self {
        let provider = RustCryptoProvider::new();
        let kex = provider.key_exchange(KeyExchangeAlgorithm::X25519).unwrap();
        let (private_key, public_key) = kex.generate_keypair().unwrap();
        Self {
            provider,
            private_key,
            public_key: public_key.into_bytes(),
            transcript: Transcript::new(),
            handshake_read: None,
            handshake_write: None,
            client_handshake_secret: Vec::new(),
            server_handshake_secret: Vec::new(),
            handshake_secret: Vec::new(),
            app_read: None,
            app_write: None,
            server_messages: Vec::new(),
        }
    }

    pub fn client_hello_message(&self) -> ClientHello {
        let mut extensions = Extensions::new();
        extensions.add(Extension::SupportedVersions(vec![0x0304, 0x0303]));
        extensions.add(Extension::KeyShareClient(vec![KeyShareEntry::new(
            GROUP_X25519,
            self.public_key.clone(),
        )]));
        ClientHello::new([0x11; 32], vec![0x1301, 0x1302])
            .with_session_id(vec![0x22; 32])
            .with_extensions(extensions)
    }

    /// ClientHello record bytes; the message enters the client transcript.
    pub fn client_hello(&mut self) -> Vec<u8> {
        let raw = HandshakeMessage::ClientHello(self.client_hello_message())
            .encode()
            .unwrap();
        self.transcript.add(&raw);
        TlsRecord::new(ContentType::Handshake, raw).encode().unwrap()
    }

    /// Consume the server flight and return the client Finished record.
    pub fn process_server_flight(&mut self, flight: &[u8]) -> Vec<u8> {
        let verify_data = self.read_server_flight(flight);
        self.finished_record(Finished::new(verify_data))
    }

    /// Consume the server flight and return the client verify_data, leaving
    /// the client handshake write sequence untouched.
    pub fn read_server_flight(&mut self, flight: &[u8]) -> Vec<u8> {
        let provider = &self.provider;
        let (records, rest) = split_records(flight).unwrap();
        assert!(rest.is_empty());

        let mut buffer = HandshakeBuffer::new();
        for record in records {
            match record.content_type {
                ContentType::Handshake => buffer.extend(&record.fragment),
                ContentType::ApplicationData => {
                    let read = self.handshake_read.as_mut().expect("ServerHello first");
                    let (content_type, content) = read.decrypt(provider, &record).unwrap();
                    assert_eq!(content_type, ContentType::Handshake);
                    buffer.extend(&content);
                },
                other => panic!("unexpected record {:?}", other),
            }

            while let Some((message, raw)) = buffer.next_message().unwrap() {
                if let HandshakeMessage::Finished(finished) = &message {
                    let expected = compute_verify_data(
                        provider,
                        &self.server_handshake_secret,
                        &self.transcript.hash(provider).unwrap(),
                    )
                    .unwrap();
                    assert_eq!(finished.verify_data, expected);
                }
                self.transcript.add(&raw);
                if let HandshakeMessage::ServerHello(server_hello) = &message {
                    let share = server_hello.extensions.server_key_share().unwrap();
                    let kex = provider.key_exchange(KeyExchangeAlgorithm::X25519).unwrap();
                    let shared = kex.exchange(&self.private_key, &share.key_exchange).unwrap();
                    let mut schedule = KeySchedule::new(provider).unwrap();
                    schedule
                        .derive_handshake_secret(provider, shared.as_bytes())
                        .unwrap();
                    schedule
                        .derive_handshake_traffic_secrets(provider, self.transcript.bytes())
                        .unwrap();
                    self.handshake_secret = schedule.handshake_secret().unwrap().to_vec();
                    self.client_handshake_secret =
                        schedule.client_handshake_traffic_secret().unwrap().to_vec();
                    self.server_handshake_secret =
                        schedule.server_handshake_traffic_secret().unwrap().to_vec();
                    self.handshake_read = Some(
                        RecordProtection::new(provider, &self.server_handshake_secret).unwrap(),
                    );
                    self.handshake_write = Some(
                        RecordProtection::new(provider, &self.client_handshake_secret).unwrap(),
                    );
                }
                self.server_messages.push(message);
            }
        }

        // Application keys bind the transcript through server Finished.
        let master = key_schedule::derive_master_secret(provider, &self.handshake_secret).unwrap();
        let client_app = key_schedule::derive_secret(
            provider,
            &master,
            b"c ap traffic",
            self.transcript.bytes(),
        )
        .unwrap();
        let server_app = key_schedule::derive_secret(
            provider,
            &master,
            b"s ap traffic",
            self.transcript.bytes(),
        )
        .unwrap();
        self.app_write = Some(RecordProtection::new(provider, &client_app).unwrap());
        self.app_read = Some(RecordProtection::new(provider, &server_app).unwrap());

        compute_verify_data(
            provider,
            &self.client_handshake_secret,
            &self.transcript.hash(provider).unwrap(),
        )
        .unwrap()
    }

    /// Seal an arbitrary Finished under the client handshake keys.
    pub fn finished_record(&mut self, finished: Finished) -> Vec<u8> {
        let raw = HandshakeMessage::Finished(finished).encode().unwrap();
        self.transcript.add(&raw);
        self.handshake_epoch_record(ContentType::Handshake, &raw)
    }

    /// Seal `data` under the client handshake keys without touching the
    /// transcript.
    pub fn handshake_epoch_record(&mut self, content_type: ContentType, data: &[u8]) -> Vec<u8> {
        self.handshake_write
            .as_mut()
            .unwrap()
            .encrypt(&self.provider, content_type, data)
            .unwrap()
            .encode()
            .unwrap()
    }
}
