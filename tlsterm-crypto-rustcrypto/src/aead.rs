//! AEAD cipher implementations using `aes-gcm`.

use aes_gcm::aead::{Aead as _, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use tlsterm_crypto::{Aead, AeadAlgorithm, Error, Result};

/// Create an AEAD cipher instance for the specified algorithm.
pub fn create_aead(algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
    Ok(Box::new(AesGcmImpl { algorithm }))
}

/// AES-GCM with a 12-byte nonce and a 16-byte tag appended to the ciphertext.
#[derive(Debug)]
struct AesGcmImpl {
    algorithm: AeadAlgorithm,
}

impl AesGcmImpl {
    fn check_sizes(&self, key: &[u8], nonce: &[u8]) -> Result<()> {
        let expected = self.algorithm.key_size();
        if key.len() != expected {
            return Err(Error::InvalidKeySize {
                expected,
                actual: key.len(),
            });
        }
        let expected = self.algorithm.nonce_size();
        if nonce.len() != expected {
            return Err(Error::InvalidNonceSize {
                expected,
                actual: nonce.len(),
            });
        }
        Ok(())
    }
}

impl Aead for AesGcmImpl {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.check_sizes(key, nonce)?;
        let payload = Payload {
            msg: plaintext,
            aad,
        };
        let nonce = Nonce::from_slice(nonce);
        let sealed = match self.algorithm {
            AeadAlgorithm::Aes128Gcm => Aes128Gcm::new_from_slice(key)
                .map_err(|_| Error::InvalidKeySize {
                    expected: 16,
                    actual: key.len(),
                })?
                .encrypt(nonce, payload),
            AeadAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|_| Error::InvalidKeySize {
                    expected: 32,
                    actual: key.len(),
                })?
                .encrypt(nonce, payload),
        };
        sealed.map_err(|_| Error::EncryptionFailed)
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.check_sizes(key, nonce)?;
        if ciphertext.len() < self.algorithm.tag_size() {
            return Err(Error::AuthenticationFailed);
        }
        let payload = Payload {
            msg: ciphertext,
            aad,
        };
        let nonce = Nonce::from_slice(nonce);
        // aes-gcm verifies the tag before decrypting into the output buffer
        let opened = match self.algorithm {
            AeadAlgorithm::Aes128Gcm => Aes128Gcm::new_from_slice(key)
                .map_err(|_| Error::InvalidKeySize {
                    expected: 16,
                    actual: key.len(),
                })?
                .decrypt(nonce, payload),
            AeadAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map_err(|_| Error::InvalidKeySize {
                    expected: 32,
                    actual: key.len(),
                })?
                .decrypt(nonce, payload),
        };
        opened.map_err(|_| Error::AuthenticationFailed)
    }

    fn algorithm(&self) -> AeadAlgorithm {
        self.algorithm
    }
}
