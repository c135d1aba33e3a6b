//! # RustCrypto-based Cryptography Provider for tlsterm
//!
//! This crate implements [`tlsterm_crypto::CryptoProvider`] on top of the
//! RustCrypto project crates.
//!
//! ## Supported Algorithms
//!
//! - **AEAD**: AES-128-GCM, AES-256-GCM (`aes-gcm`)
//! - **Hash**: SHA-256, SHA-384 (`sha2`)
//! - **HMAC**: with SHA-256, SHA-384 (`hmac`)
//! - **KDF**: HKDF-Extract, HKDF-Expand (`hkdf`)
//! - **Key Exchange**: X25519 (`x25519-dalek`)
//! - **Signatures**: RSA-PSS-RSAE-SHA256 (`rsa`)
//! - **RNG**: operating system entropy (`rand::rngs::OsRng`), or any injected
//!   [`Random`] implementation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tlsterm_crypto::CryptoProvider;
//! use tlsterm_crypto_rustcrypto::RustCryptoProvider;
//!
//! let provider = RustCryptoProvider::new();
//! assert!(provider.supports_key_exchange(tlsterm_crypto::KeyExchangeAlgorithm::X25519));
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

use std::sync::Arc;

use tlsterm_crypto::{
    Aead, AeadAlgorithm, CryptoProvider, Hash, HashAlgorithm, Hmac, Kdf, KdfAlgorithm,
    KeyExchange, KeyExchangeAlgorithm, Random, Result, Signature, SignatureAlgorithm,
};

pub mod aead;
pub mod hash;
pub mod hkdf;
pub mod hmac;
pub mod kex;
pub mod random;
pub mod signature;

pub use random::OsRandom;

/// Cryptography provider using RustCrypto implementations.
///
/// All randomness (ephemeral X25519 keys, RSA-PSS salts, and whatever the
/// protocol core draws through [`CryptoProvider::random`]) comes from a single
/// shared [`Random`] source.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tlsterm_crypto::CryptoProvider;
/// use tlsterm_crypto_rustcrypto::{OsRandom, RustCryptoProvider};
///
/// let provider = RustCryptoProvider::with_random(Arc::new(OsRandom));
/// ```
#[derive(Clone)]
pub struct RustCryptoProvider {
    random: Arc<dyn Random>,
}

impl std::fmt::Debug for RustCryptoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustCryptoProvider").finish_non_exhaustive()
    }
}

impl Default for RustCryptoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RustCryptoProvider {
    /// Create a provider drawing randomness from `random`.
    pub fn with_random(random: Arc<dyn Random>) -> Self {
        Self { random }
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn new() -> Self {
        Self::with_random(Arc::new(OsRandom))
    }

    fn aead(&self, algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
        aead::create_aead(algorithm)
    }

    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
        hash::create_hash(algorithm)
    }

    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
        hmac::create_hmac(algorithm, key)
    }

    fn kdf(&self, algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>> {
        hkdf::create_kdf(algorithm)
    }

    fn random(&self) -> &dyn Random {
        self.random.as_ref()
    }

    fn key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>> {
        kex::create_key_exchange(algorithm, Arc::clone(&self.random))
    }

    fn signature(&self, algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>> {
        signature::create_signature(algorithm, Arc::clone(&self.random))
    }
}
