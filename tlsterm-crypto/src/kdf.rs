//! Key Derivation Function (KDF) interface.

use crate::{HashAlgorithm, Result};

/// KDF algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KdfAlgorithm {
    /// HKDF with SHA-256
    HkdfSha256,
    /// HKDF with SHA-384 (TLS_AES_256_GCM_SHA384)
    HkdfSha384,
}

impl KdfAlgorithm {
    /// Get the underlying hash algorithm.
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            KdfAlgorithm::HkdfSha256 => HashAlgorithm::Sha256,
            KdfAlgorithm::HkdfSha384 => HashAlgorithm::Sha384,
        }
    }

    /// Get the name of this KDF algorithm.
    pub const fn name(self) -> &'static str {
        match self {
            KdfAlgorithm::HkdfSha256 => "HKDF-SHA256",
            KdfAlgorithm::HkdfSha384 => "HKDF-SHA384",
        }
    }
}

/// KDF trait (RFC 5869).
///
/// - Extract: `HKDF-Extract(salt, IKM) -> PRK`
/// - Expand: `HKDF-Expand(PRK, info, length) -> OKM`
///
/// ```rust,no_run
/// use tlsterm_crypto::Kdf;
///
/// fn derive_keys(kdf: &dyn Kdf) -> Vec<u8> {
///     let prk = kdf.extract(b"salt", b"input key material");
///     kdf.expand(&prk, b"application info", 32).unwrap()
/// }
/// ```
pub trait Kdf: Send + Sync {
    /// HKDF-Extract: returns a PRK of `hash_output_size` bytes.
    fn extract(&self, salt: &[u8], ikm: &[u8]) -> Vec<u8>;

    /// HKDF-Expand: expand a PRK to exactly `length` bytes.
    ///
    /// # Errors
    ///
    /// `InvalidLength` if `length > 255 * hash_output_size`.
    fn expand(&self, prk: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>>;

    /// Get the KDF algorithm.
    fn algorithm(&self) -> KdfAlgorithm;

    /// Get the output size of the underlying hash function.
    fn hash_output_size(&self) -> usize {
        self.algorithm().hash_algorithm().output_size()
    }

    /// Largest output `expand` will produce.
    fn max_output_size(&self) -> usize {
        255 * self.hash_output_size()
    }
}
