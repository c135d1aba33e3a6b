//! Ephemeral ECDHE.

use crate::Result;
use zeroize::Zeroize;

/// Key exchange algorithms (TLS `NamedGroup`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeAlgorithm {
    /// X25519 (Curve25519 ECDHE)
    X25519,
}

impl KeyExchangeAlgorithm {
    /// Encoded public key length.
    pub const fn public_key_size(self) -> usize {
        match self {
            KeyExchangeAlgorithm::X25519 => 32,
        }
    }

    /// Shared secret length.
    pub const fn shared_secret_size(self) -> usize {
        match self {
            KeyExchangeAlgorithm::X25519 => 32,
        }
    }

    /// IANA `NamedGroup` code point.
    pub const fn to_u16(self) -> u16 {
        match self {
            KeyExchangeAlgorithm::X25519 => 0x001D,
        }
    }

    /// Parse a `NamedGroup` code point.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x001D => Some(KeyExchangeAlgorithm::X25519),
            _ => None,
        }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            KeyExchangeAlgorithm::X25519 => "x25519",
        }
    }
}

/// Ephemeral private scalar. Wiped on drop, redacted in `Debug`.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct PrivateKey {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl PrivateKey {
    /// Wrap raw scalar bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Raw scalar bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Encoded public key as sent in a key_share entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Wrap encoded key bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encoded key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// ECDHE output. Wiped on drop, redacted in `Debug`.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl SharedSecret {
    /// Wrap secret bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// One ECDHE group.
///
/// ```rust,no_run
/// use tlsterm_crypto::KeyExchange;
///
/// fn key_exchange_example(kex: &dyn KeyExchange, peer_public_key: &[u8]) {
///     let (private_key, public_key) = kex.generate_keypair().unwrap();
///     let shared_secret = kex.exchange(&private_key, peer_public_key).unwrap();
///     # let _ = (public_key, shared_secret);
/// }
/// ```
pub trait KeyExchange: Send + Sync {
    /// Generate an ephemeral key pair from the provider's randomness source.
    fn generate_keypair(&self) -> Result<(PrivateKey, PublicKey)>;

    /// Combine our private key with the peer's encoded public key.
    ///
    /// # Errors
    ///
    /// - `InvalidPublicKey` if the peer's public key has the wrong size
    /// - `KeyExchangeFailed` if the result is the all-zero (non-contributory) value
    fn exchange(&self, private_key: &PrivateKey, peer_public_key: &[u8]) -> Result<SharedSecret>;

    /// Which group this is.
    fn algorithm(&self) -> KeyExchangeAlgorithm;

    /// Encoded public key length.
    fn public_key_size(&self) -> usize {
        self.algorithm().public_key_size()
    }
}
