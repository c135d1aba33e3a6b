//! Authenticated encryption for record protection.

use crate::Result;

/// AEAD constructions known to the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeadAlgorithm {
    /// AES-128-GCM
    Aes128Gcm,
    /// AES-256-GCM (TLS_AES_256_GCM_SHA384)
    Aes256Gcm,
}

impl AeadAlgorithm {
    /// Key length in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            AeadAlgorithm::Aes128Gcm => 16,
            AeadAlgorithm::Aes256Gcm => 32,
        }
    }

    /// Nonce length in bytes; 12 for both GCM variants.
    pub const fn nonce_size(self) -> usize {
        12
    }

    /// Tag length in bytes.
    pub const fn tag_size(self) -> usize {
        16
    }

    /// Name as it appears in TLS suite names.
    pub const fn name(self) -> &'static str {
        match self {
            AeadAlgorithm::Aes128Gcm => "AES_128_GCM",
            AeadAlgorithm::Aes256Gcm => "AES_256_GCM",
        }
    }
}

/// A stateless AEAD; the key is passed on every call.
///
/// # Security Requirements
///
/// - Tag verification MUST be constant-time
/// - `open` MUST NOT release any plaintext when the tag does not verify
/// - Nonces MUST NOT be reused with the same key
///
/// # Example
///
/// ```rust,no_run
/// use tlsterm_crypto::Aead;
///
/// fn encrypt_example(aead: &dyn Aead) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
///     let key = &[0u8; 32];
///     let nonce = &[0u8; 12];
///     let ciphertext = aead.seal(key, nonce, b"additional data", b"secret message")?;
///     Ok(ciphertext)
/// }
/// ```
pub trait Aead: Send + Sync {
    /// Seal `plaintext`, returning ciphertext with the tag appended.
    ///
    /// # Errors
    ///
    /// - `InvalidKeySize` if key size doesn't match
    /// - `InvalidNonceSize` if nonce size doesn't match
    /// - `EncryptionFailed` for other errors
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Verify and decrypt `ciphertext || tag`.
    ///
    /// # Errors
    ///
    /// - `InvalidKeySize` if key size doesn't match
    /// - `InvalidNonceSize` if nonce size doesn't match
    /// - `AuthenticationFailed` if tag verification fails
    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Which construction this is.
    fn algorithm(&self) -> AeadAlgorithm;

    /// Tag length in bytes.
    fn tag_size(&self) -> usize {
        self.algorithm().tag_size()
    }
}
