//! Streaming digests for the handshake transcript.

use crate::kdf::KdfAlgorithm;

/// Digest algorithms the provider can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256 (32 bytes output)
    Sha256,
    /// SHA-384 (48 bytes output)
    Sha384,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    pub const fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
        }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
        }
    }

    /// HKDF over the same digest.
    pub const fn to_kdf_algorithm(self) -> KdfAlgorithm {
        match self {
            HashAlgorithm::Sha256 => KdfAlgorithm::HkdfSha256,
            HashAlgorithm::Sha384 => KdfAlgorithm::HkdfSha384,
        }
    }
}

/// An in-progress digest.
///
/// ```rust,ignore
/// fn hash_example(mut hash: Box<dyn tlsterm_crypto::Hash>) -> Vec<u8> {
///     hash.update(b"Hello, ");
///     hash.update(b"world!");
///     hash.finalize()
/// }
/// ```
pub trait Hash: Send {
    /// Absorb `data`.
    fn update(&mut self, data: &[u8]);

    /// Consume the state and return the digest.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Which digest this is.
    fn algorithm(&self) -> HashAlgorithm;

    /// Digest length in bytes.
    fn output_size(&self) -> usize {
        self.algorithm().output_size()
    }
}
