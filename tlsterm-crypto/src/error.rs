//! Provider errors.

use std::fmt;

/// Result alias used throughout the provider interface.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a cryptographic primitive.
///
/// None of the variants carry secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Key length does not fit the algorithm
    InvalidKeySize {
        /// Length the algorithm needs
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Nonce length does not fit the algorithm
    InvalidNonceSize {
        /// Length the algorithm needs
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Requested output length is out of range (HKDF-Expand above 255 blocks)
    InvalidLength,

    /// AEAD tag mismatch; no plaintext is released
    AuthenticationFailed,

    /// A signature did not verify
    SignatureVerificationFailed,

    /// Peer or encoded public key is malformed
    InvalidPublicKey,

    /// Signing key could not be parsed
    InvalidPrivateKey,

    /// ECDHE produced the all-zero shared secret
    KeyExchangeFailed,

    /// The AEAD backend refused to seal
    EncryptionFailed,

    /// The randomness source could not deliver
    RandomGenerationFailed,

    /// Backend failure with a description
    CryptoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidKeySize { expected, actual } => {
                write!(f, "Key is {} bytes, algorithm needs {}", actual, expected)
            },
            Error::InvalidNonceSize { expected, actual } => {
                write!(f, "Nonce is {} bytes, algorithm needs {}", actual, expected)
            },
            Error::InvalidLength => write!(f, "Output length out of range"),
            Error::AuthenticationFailed => write!(f, "AEAD authentication failed"),
            Error::SignatureVerificationFailed => write!(f, "Bad signature"),
            Error::InvalidPublicKey => write!(f, "Malformed public key"),
            Error::InvalidPrivateKey => write!(f, "Malformed private key"),
            Error::KeyExchangeFailed => write!(f, "Non-contributory key exchange"),
            Error::EncryptionFailed => write!(f, "AEAD seal failed"),
            Error::RandomGenerationFailed => write!(f, "Randomness source exhausted or failed"),
            Error::CryptoError(msg) => write!(f, "Crypto backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
