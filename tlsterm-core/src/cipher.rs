//! Cipher suite definitions.

use tlsterm_crypto::{AeadAlgorithm, HashAlgorithm, KdfAlgorithm};

/// TLS 1.3 cipher suite.
///
/// The server speaks a single suite; the enum keeps the code point and the
/// derived algorithm choices in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CipherSuite {
    /// TLS_AES_256_GCM_SHA384
    Aes256GcmSha384 = 0x1302,
}

impl CipherSuite {
    /// Create from wire format (u16).
    ///
    /// Suites other than `TLS_AES_256_GCM_SHA384` are not recognised.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x1302 => Some(CipherSuite::Aes256GcmSha384),
            _ => None,
        }
    }

    /// Convert to wire format (u16).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Get the AEAD algorithm for this cipher suite.
    pub const fn aead_algorithm(self) -> AeadAlgorithm {
        match self {
            CipherSuite::Aes256GcmSha384 => AeadAlgorithm::Aes256Gcm,
        }
    }

    /// Get the hash algorithm for this cipher suite.
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            CipherSuite::Aes256GcmSha384 => HashAlgorithm::Sha384,
        }
    }

    /// HKDF variant for the key schedule.
    pub const fn kdf_algorithm(self) -> KdfAlgorithm {
        self.hash_algorithm().to_kdf_algorithm()
    }

    /// Hash output length, which is also the length of every secret.
    pub const fn hash_length(self) -> usize {
        self.hash_algorithm().output_size()
    }

    /// Get the key length for this cipher suite.
    pub const fn key_length(self) -> usize {
        self.aead_algorithm().key_size()
    }

    /// Get the IV length for this cipher suite.
    pub const fn iv_length(self) -> usize {
        self.aead_algorithm().nonce_size()
    }

    /// Get the cipher suite name.
    pub const fn name(self) -> &'static str {
        match self {
            CipherSuite::Aes256GcmSha384 => "TLS_AES_256_GCM_SHA384",
        }
    }
}
