//! Digital signature algorithms for TLS.

use crate::Result;

/// Signature algorithms (TLS `SignatureScheme`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// RSA-PSS with SHA-256, rsaEncryption public key
    RsaPssRsaeSha256,
}

impl SignatureAlgorithm {
    /// Convert to wire format (IANA SignatureScheme code point).
    pub const fn to_u16(self) -> u16 {
        match self {
            SignatureAlgorithm::RsaPssRsaeSha256 => 0x0804,
        }
    }

    /// Create from IANA code point.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0804 => Some(SignatureAlgorithm::RsaPssRsaeSha256),
            _ => None,
        }
    }

    /// Get the algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            SignatureAlgorithm::RsaPssRsaeSha256 => "rsa_pss_rsae_sha256",
        }
    }

    /// PSS salt length in bytes (equal to the digest length).
    pub const fn salt_len(self) -> usize {
        match self {
            SignatureAlgorithm::RsaPssRsaeSha256 => 32,
        }
    }
}

/// Digital signature trait.
///
/// Keys are passed as DER: the signing key as PKCS#8 `PrivateKeyInfo` or
/// PKCS#1 `RSAPrivateKey`, the verifying key as SPKI or PKCS#1 `RSAPublicKey`.
pub trait Signature: Send + Sync {
    /// Sign a message.
    ///
    /// # Errors
    ///
    /// - `InvalidPrivateKey` if the signing key cannot be parsed
    /// - `RandomGenerationFailed` if a salt could not be drawn
    fn sign(&self, signing_key: &[u8], message: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature.
    ///
    /// # Errors
    ///
    /// - `InvalidPublicKey` if the verifying key cannot be parsed
    /// - `SignatureVerificationFailed` if the signature doesn't match
    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()>;

    /// Check that `signing_key` parses as a key this algorithm can sign with.
    ///
    /// # Errors
    ///
    /// - `InvalidPrivateKey` if it cannot
    fn check_signing_key(&self, signing_key: &[u8]) -> Result<()>;

    /// Get the algorithm this signature implements.
    fn algorithm(&self) -> SignatureAlgorithm;
}
