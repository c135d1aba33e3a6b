//! # tlsterm Cryptographic Provider Interface
//!
//! This crate defines the cryptographic seam of tlsterm. The protocol core only
//! ever talks to these traits, so a backend can be swapped (or replaced by a
//! scripted one in tests) without touching the handshake or record code.
//!
//! ## Architecture
//!
//! ```text
//! CryptoProvider (main trait)
//! ├── Aead (AES-256-GCM record protection)
//! ├── Hash (SHA-256, SHA-384 transcript hashing)
//! ├── Hmac (Finished verify_data)
//! ├── Kdf (HKDF-Extract / HKDF-Expand)
//! ├── Random (ServerHello random, ephemeral keys, PSS salts)
//! ├── KeyExchange (X25519)
//! └── Signature (RSA-PSS for CertificateVerify)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use tlsterm_crypto::{AeadAlgorithm, CryptoProvider};
//!
//! fn example(provider: &dyn CryptoProvider) -> tlsterm_crypto::Result<()> {
//!     let aead = provider.aead(AeadAlgorithm::Aes256Gcm)?;
//!     let sealed = aead.seal(&[0u8; 32], &[0u8; 12], b"aad", b"hello")?;
//!     let opened = aead.open(&[0u8; 32], &[0u8; 12], b"aad", &sealed)?;
//!     assert_eq!(opened, b"hello");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

pub mod aead;
pub mod error;
pub mod hash;
pub mod hmac;
pub mod kdf;
pub mod key_exchange;
pub mod random;
pub mod signature;

pub use aead::{Aead, AeadAlgorithm};
pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm};
pub use hmac::Hmac;
pub use kdf::{Kdf, KdfAlgorithm};
pub use key_exchange::{KeyExchange, KeyExchangeAlgorithm};
pub use random::Random;
pub use signature::{Signature, SignatureAlgorithm};

/// The main cryptographic provider trait.
///
/// Implementations hand out boxed primitive instances on demand. The trait is
/// object-safe so the protocol core can hold a `&dyn CryptoProvider` (or an
/// `Arc<dyn CryptoProvider>` shared by every connection of a listener).
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Per-connection state never lives
/// in the provider; it only owns stateless algorithm tables and the randomness
/// source.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Create a new instance of the crypto provider.
    fn new() -> Self
    where
        Self: Sized;

    /// Get an AEAD cipher instance.
    fn aead(&self, algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>>;

    /// Get a hash function instance.
    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>>;

    /// Get an HMAC instance keyed with `key`.
    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>>;

    /// Get a KDF (Key Derivation Function) instance.
    fn kdf(&self, algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>>;

    /// Get the random number generator.
    ///
    /// Every random byte the provider or the protocol core consumes is drawn
    /// from this source.
    fn random(&self) -> &dyn Random;

    /// Get a key exchange instance.
    fn key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>>;

    /// Get a signature scheme instance.
    fn signature(&self, algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>>;

    /// Check if the provider supports a specific AEAD algorithm.
    fn supports_aead(&self, algorithm: AeadAlgorithm) -> bool {
        self.aead(algorithm).is_ok()
    }

    /// Check if the provider supports a specific key exchange algorithm.
    fn supports_key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> bool {
        self.key_exchange(algorithm).is_ok()
    }

    /// Check if the provider supports a specific signature algorithm.
    fn supports_signature(&self, algorithm: SignatureAlgorithm) -> bool {
        self.signature(algorithm).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_code_points() {
        assert_eq!(KeyExchangeAlgorithm::X25519.to_u16(), 0x001d);
        assert_eq!(SignatureAlgorithm::RsaPssRsaeSha256.to_u16(), 0x0804);
        assert_eq!(HashAlgorithm::Sha384.output_size(), 48);
        assert_eq!(AeadAlgorithm::Aes256Gcm.key_size(), 32);
    }
}
