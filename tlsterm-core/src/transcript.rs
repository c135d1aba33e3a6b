//! Transcript management for TLS 1.3 handshakes.
//!
//! The transcript is the exact concatenation of every handshake message
//! (4-byte header included) sent or received so far, in protocol order. It is
//! used for:
//! - Deriving handshake and application traffic secrets
//! - The CertificateVerify signed content
//! - Computing and checking Finished verify data
//!
//! Per RFC 8446 Section 4.4.1:
//! "The transcript hash is computed as Hash(Handshake Context)"

use crate::error::Result;
use crate::key_schedule::{self, HASH_LEN, SUITE};
use tlsterm_crypto::CryptoProvider;

/// Append-only handshake transcript.
///
/// Messages are never mutated once added; the hash is always recomputed from
/// the accumulated bytes.
///
/// # Example
/// ```rust,ignore
/// let mut transcript = Transcript::new();
/// transcript.add(&client_hello_bytes);
/// transcript.add(&server_hello_bytes);
/// let hash = transcript.hash(&provider)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    bytes: Vec<u8>,
    message_count: usize,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one encoded handshake message.
    pub fn add(&mut self, message: &[u8]) {
        self.bytes.extend_from_slice(message);
        self.message_count += 1;
    }

    /// The accumulated message bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SHA-384 of the accumulated bytes.
    pub fn hash(&self, provider: &dyn CryptoProvider) -> Result<Vec<u8>> {
        key_schedule::transcript_hash(provider, &self.bytes)
    }

    /// Number of messages added.
    pub fn message_count(&self) -> usize {
        self.message_count
    }

    /// Total accumulated length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the transcript, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Helper for computing Finished message verify data.
///
/// Per RFC 8446 Section 4.4.4:
/// ```text
/// finished_key =
///     HKDF-Expand-Label(BaseKey, "finished", "", Hash.length)
/// verify_data =
///     HMAC(finished_key, Transcript-Hash(Handshake Context))
/// ```
pub fn compute_verify_data(
    provider: &dyn CryptoProvider,
    base_key: &[u8],
    transcript_hash: &[u8],
) -> Result<Vec<u8>> {
    let finished_key = zeroize::Zeroizing::new(key_schedule::hkdf_expand_label(
        provider,
        base_key,
        b"finished",
        &[],
        HASH_LEN,
    )?);
    let mut hmac = provider.hmac(SUITE.hash_algorithm(), &finished_key)?;
    hmac.update(transcript_hash);
    Ok(hmac.finalize())
}

/// Constant-time check of a peer's Finished verify data.
pub fn verify_finished(
    provider: &dyn CryptoProvider,
    base_key: &[u8],
    transcript_hash: &[u8],
    verify_data: &[u8],
) -> Result<bool> {
    let finished_key = zeroize::Zeroizing::new(key_schedule::hkdf_expand_label(
        provider,
        base_key,
        b"finished",
        &[],
        HASH_LEN,
    )?);
    let mut hmac = provider.hmac(SUITE.hash_algorithm(), &finished_key)?;
    hmac.update(transcript_hash);
    Ok(hmac.verify(verify_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlsterm_crypto::CryptoProvider;
    use tlsterm_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_transcript_basic() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.add(b"ab");
        transcript.add(b"c");
        assert_eq!(transcript.message_count(), 2);
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.bytes(), b"abc");
    }

    #[test]
    fn test_transcript_hash_matches_concatenation() {
        let provider = RustCryptoProvider::new();
        let mut transcript = Transcript::new();
        transcript.add(b"a");
        transcript.add(b"bc");
        assert_eq!(
            hex::encode(transcript.hash(&provider).unwrap()),
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed\
             8086072ba1e7cc2358baeca134c825a7"
        );
    }

    #[test]
    fn test_compute_verify_data() {
        let provider = RustCryptoProvider::new();
        let base_key = vec![0x42u8; 48];
        let hash = vec![0x55u8; 48];

        let verify_data = compute_verify_data(&provider, &base_key, &hash).unwrap();
        assert_eq!(verify_data.len(), 48);
        assert_eq!(
            verify_data,
            compute_verify_data(&provider, &base_key, &hash).unwrap()
        );

        assert!(verify_finished(&provider, &base_key, &hash, &verify_data).unwrap());

        let mut tampered = verify_data.clone();
        tampered[47] ^= 1;
        assert!(!verify_finished(&provider, &base_key, &hash, &tampered).unwrap());
        assert!(!verify_finished(&provider, &base_key, &hash, &verify_data[..32]).unwrap());
    }
}
