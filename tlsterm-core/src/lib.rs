//! # tlsterm Core
//!
//! Server-side TLS 1.3 handshake and record layer.
//!
//! This crate turns inbound transport bytes into outbound transport bytes and
//! decrypted application messages. It never opens sockets or files:
//! - Binary codec for records, handshake messages and extensions
//! - Key schedule (HKDF over SHA-384) and AES-256-GCM record protection
//! - Server handshake state machine
//! - Application data channel
//! - A per-connection [`ServerSession`] tying them together
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │       Transport driver (tlsterm)        │
//! └─────────────────┬───────────────────────┘
//!                   │ bytes in / bytes out
//! ┌─────────────────▼───────────────────────┐
//! │      tlsterm-core (this crate)          │
//! │  ┌──────────────────────────────────┐   │
//! │  │   ServerSession                  │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Handshake State Machine        │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Application Data Channel       │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Record Layer / Key Schedule    │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Binary Codec                   │   │
//! │  └──────────────────────────────────┘   │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │     tlsterm-crypto (trait interface)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Negotiated parameters
//!
//! Fixed: `TLS_AES_256_GCM_SHA384`, X25519, `rsa_pss_rsae_sha256`.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export crypto interface
pub use tlsterm_crypto;

pub mod application;
pub mod cipher;
pub(crate) mod codec;
pub mod credentials;
pub mod error;
pub mod extensions;
pub mod handshake;
pub mod key_schedule;
pub mod messages;
pub mod protocol;
pub mod record;
pub mod record_protection;
pub mod session;
pub mod transcript;

// Re-exports
pub use application::ApplicationDataChannel;
pub use error::{Alert, AlertDescription, AlertLevel, Error, Result};
pub use handshake::{HandshakeArtifacts, ServerHandshake, ServerState};
pub use protocol::{ContentType, ProtocolVersion};
pub use record::MAX_FRAGMENT_SIZE;
pub use session::{ServerSession, SessionOutput};

use std::time::{SystemTime, UNIX_EPOCH};
use tlsterm_crypto::{CryptoProvider, SignatureAlgorithm};
use zeroize::Zeroizing;

/// Server configuration.
///
/// Holds the credentials (already decoded to DER) and a few knobs. Shared by
/// every session of a listener behind an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use tlsterm_core::Config;
///
/// let config = Config::builder()
///     .with_certificate_chain_pem(&cert_pem)
///     .with_private_key_pem(&key_pem)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct Config {
    certificate_chain: Vec<Vec<u8>>,
    private_key: Zeroizing<Vec<u8>>,
    fixed_unix_time: Option<u32>,
    max_fragment_length: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("certificates", &self.certificate_chain.len())
            .field("fixed_unix_time", &self.fixed_unix_time)
            .field("max_fragment_length", &self.max_fragment_length)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// DER certificates, leaf first.
    pub fn certificate_chain(&self) -> &[Vec<u8>] {
        &self.certificate_chain
    }

    /// DER signing key (PKCS#8 or PKCS#1).
    pub fn private_key_der(&self) -> &[u8] {
        &self.private_key
    }

    /// Outgoing plaintext fragment limit.
    pub fn max_fragment_length(&self) -> usize {
        self.max_fragment_length
    }

    /// Timestamp for the ServerHello random: the pinned value, or now.
    pub fn unix_time(&self) -> u32 {
        self.fixed_unix_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(0)
        })
    }
}

/// Configuration builder for the server.
pub struct ConfigBuilder {
    certificate_chain_pem: Option<String>,
    private_key_pem: Option<Zeroizing<String>>,
    fixed_unix_time: Option<u32>,
    max_fragment_length: usize,
}

impl std::fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("has_certificate_chain", &self.certificate_chain_pem.is_some())
            .field("has_private_key", &self.private_key_pem.is_some())
            .field("fixed_unix_time", &self.fixed_unix_time)
            .field("max_fragment_length", &self.max_fragment_length)
            .finish()
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            certificate_chain_pem: None,
            private_key_pem: None,
            fixed_unix_time: None,
            max_fragment_length: MAX_FRAGMENT_SIZE,
        }
    }
}

impl ConfigBuilder {
    /// Set the certificate chain: `CERTIFICATE` PEM blocks, leaf first.
    pub fn with_certificate_chain_pem(mut self, pem: &str) -> Self {
        self.certificate_chain_pem = Some(pem.to_owned());
        self
    }

    /// Set the private key: `PRIVATE KEY` or `RSA PRIVATE KEY` PEM.
    pub fn with_private_key_pem(mut self, pem: &str) -> Self {
        self.private_key_pem = Some(Zeroizing::new(pem.to_owned()));
        self
    }

    /// Pin the ServerHello timestamp.
    pub fn with_fixed_unix_time(mut self, unix_time: u32) -> Self {
        self.fixed_unix_time = Some(unix_time);
        self
    }

    /// Set maximum outgoing fragment length (1..=16384).
    pub fn with_max_fragment_length(mut self, length: usize) -> Self {
        self.max_fragment_length = length;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config> {
        if self.max_fragment_length == 0 || self.max_fragment_length > MAX_FRAGMENT_SIZE {
            return Err(Error::InvalidConfig(format!(
                "Max fragment length {} outside 1..={}",
                self.max_fragment_length, MAX_FRAGMENT_SIZE
            )));
        }

        let chain_pem = self
            .certificate_chain_pem
            .ok_or_else(|| Error::InvalidConfig("No certificate chain".into()))?;
        let key_pem = self
            .private_key_pem
            .ok_or_else(|| Error::InvalidConfig("No private key".into()))?;

        Ok(Config {
            certificate_chain: credentials::parse_certificate_chain(&chain_pem)?,
            private_key: credentials::parse_private_key(&key_pem)?,
            fixed_unix_time: self.fixed_unix_time,
            max_fragment_length: self.max_fragment_length,
        })
    }

    /// Build the configuration and check that `provider` can sign with the
    /// private key.
    ///
    /// [`build`](Self::build) only checks the DER framing of the key; this
    /// catches a key the signer would reject on the first handshake.
    pub fn build_with(self, provider: &dyn CryptoProvider) -> Result<Config> {
        let config = self.build()?;
        provider
            .signature(SignatureAlgorithm::RsaPssRsaeSha256)?
            .check_signing_key(&config.private_key)
            .map_err(|e| Error::InvalidConfig(format!("Private key: {}", e)))?;
        Ok(config)
    }
}
