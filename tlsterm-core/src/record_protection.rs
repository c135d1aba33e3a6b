//! TLS 1.3 Record Protection (AEAD Encryption/Decryption)
//!
//! This module implements the AEAD encryption and decryption for TLS 1.3 records
//! as specified in RFC 8446 Section 5.2.
//!
//! # TLS 1.3 AEAD Construction
//! - Additional Data (AD): record header (type, version, length)
//! - Nonce: per-record nonce derived from IV and sequence number
//! - Plaintext: content + content_type + optional padding
//! - Output: encrypted_record = AEAD-Encrypt(key, nonce, plaintext, ad)
//!
//! # Nonce Construction (RFC 8446 Section 5.3)
//! ```text
//! nonce = per_record_nonce XOR iv
//! where per_record_nonce = sequence_number (padded to IV length)
//! ```

use crate::error::{Error, Result};
use crate::key_schedule::{self, TrafficKeys};
use crate::protocol::{ContentType, ProtocolVersion};
use crate::record::{TlsRecord, MAX_CIPHERTEXT_SIZE, MAX_FRAGMENT_SIZE, RECORD_HEADER_SIZE};
use tlsterm_crypto::CryptoProvider;

/// AES-GCM tag length.
const TAG_SIZE: usize = 16;

/// Record protection state for one direction of one epoch.
///
/// Holds the write key, the static IV and the sequence number. The sequence
/// number starts at zero and moves forward by exactly one per record; a new
/// epoch means a new `RecordProtection`.
pub struct RecordProtection {
    keys: TrafficKeys,
    sequence_number: u64,
}

impl std::fmt::Debug for RecordProtection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordProtection")
            .field("sequence_number", &self.sequence_number)
            .finish_non_exhaustive()
    }
}

impl RecordProtection {
    /// Derive key and IV from a traffic secret and start at sequence 0.
    pub fn new(provider: &dyn CryptoProvider, traffic_secret: &[u8]) -> Result<Self> {
        Ok(Self::from_keys(TrafficKeys::derive(provider, traffic_secret)?))
    }

    /// Start at sequence 0 with already derived keys.
    pub fn from_keys(keys: TrafficKeys) -> Self {
        Self {
            keys,
            sequence_number: 0,
        }
    }

    /// Encrypt one fragment into an `application_data` record.
    ///
    /// 1. Build TLSInnerPlaintext: fragment || content_type (no padding)
    /// 2. Compute nonce: sequence_number XOR iv
    /// 3. Build additional_data: 0x17 || 0x0303 || length
    /// 4. Seal, then advance the sequence number
    pub fn encrypt(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        fragment: &[u8],
    ) -> Result<TlsRecord> {
        if fragment.len() > MAX_FRAGMENT_SIZE {
            return Err(Error::InternalError(format!(
                "Fragment of {} bytes exceeds {}",
                fragment.len(),
                MAX_FRAGMENT_SIZE
            )));
        }
        // Fail before sealing so a nonce is never used twice.
        let next = self
            .sequence_number
            .checked_add(1)
            .ok_or_else(|| Error::InternalError("Sequence number overflow".into()))?;

        let mut plaintext = Vec::with_capacity(fragment.len() + 1);
        plaintext.extend_from_slice(fragment);
        plaintext.push(content_type.to_u8());

        let nonce = self.current_nonce()?;
        let additional_data = build_additional_data(plaintext.len() + TAG_SIZE);
        let ciphertext = key_schedule::aead_encrypt(
            provider,
            &self.keys.key,
            &nonce,
            &additional_data,
            &plaintext,
        )?;

        tracing::debug!(
            sequence = self.sequence_number,
            inner_type = ?content_type,
            length = ciphertext.len(),
            "Sealed record"
        );
        self.sequence_number = next;
        Ok(TlsRecord::new(ContentType::ApplicationData, ciphertext))
    }

    /// Decrypt a protected record, returning the inner content type and content.
    ///
    /// The sequence number only advances when the tag verifies. On any error
    /// no plaintext is returned.
    pub fn decrypt(
        &mut self,
        provider: &dyn CryptoProvider,
        record: &TlsRecord,
    ) -> Result<(ContentType, Vec<u8>)> {
        if record.content_type != ContentType::ApplicationData {
            return Err(Error::ProtocolSequence(format!(
                "Expected protected record, got {:?}",
                record.content_type
            )));
        }
        if record.fragment.len() > MAX_CIPHERTEXT_SIZE {
            return Err(Error::RecordOverflow(record.fragment.len()));
        }
        if record.fragment.len() < TAG_SIZE + 1 {
            return Err(Error::DecodeError(format!(
                "Protected record of {} bytes is shorter than a tag",
                record.fragment.len()
            )));
        }
        let next = self
            .sequence_number
            .checked_add(1)
            .ok_or_else(|| Error::InternalError("Sequence number overflow".into()))?;

        let nonce = self.current_nonce()?;
        let additional_data = build_additional_data(record.fragment.len());
        let mut inner = key_schedule::aead_decrypt(
            provider,
            &self.keys.key,
            &nonce,
            &additional_data,
            &record.fragment,
        )?;
        self.sequence_number = next;

        // TLSInnerPlaintext = content || content_type || zeros*
        let type_pos = inner
            .iter()
            .rposition(|&b| b != 0)
            .ok_or_else(|| Error::ProtocolSequence("Protected record has no content type".into()))?;
        let type_byte = inner[type_pos];
        let content_type = ContentType::from_u8(type_byte).ok_or_else(|| {
            Error::DecodeError(format!("Invalid inner content type 0x{:02x}", type_byte))
        })?;
        inner.truncate(type_pos);
        if inner.len() > MAX_FRAGMENT_SIZE {
            return Err(Error::RecordOverflow(inner.len()));
        }

        tracing::debug!(
            sequence = next - 1,
            inner_type = ?content_type,
            length = inner.len(),
            "Opened record"
        );
        Ok((content_type, inner))
    }

    /// Nonce the next record in this direction will use.
    pub fn current_nonce(&self) -> Result<Vec<u8>> {
        key_schedule::build_nonce(&self.keys.iv, self.sequence_number)
    }

    /// Get the current sequence number.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    #[cfg(test)]
    pub(crate) fn set_sequence_number(&mut self, seq: u64) {
        self.sequence_number = seq;
    }
}

/// additional_data = TLSCiphertext.opaque_type ||
///                   TLSCiphertext.legacy_record_version ||
///                   TLSCiphertext.length
fn build_additional_data(encrypted_length: usize) -> [u8; RECORD_HEADER_SIZE] {
    let version = ProtocolVersion::Tls12.to_u16().to_be_bytes();
    // Callers keep encrypted_length within MAX_CIPHERTEXT_SIZE.
    let length = (encrypted_length as u16).to_be_bytes();
    [
        ContentType::ApplicationData.to_u8(),
        version[0],
        version[1],
        length[0],
        length[1],
    ]
}
