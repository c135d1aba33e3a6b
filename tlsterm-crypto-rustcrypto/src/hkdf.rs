//! HKDF implementations using the `hkdf` crate.

use hkdf::SimpleHkdf;
use sha2::{Sha256, Sha384};
use tlsterm_crypto::{Error, Kdf, KdfAlgorithm, Result};

/// Create a KDF instance for the specified algorithm.
pub fn create_kdf(algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>> {
    Ok(Box::new(HkdfImpl { algorithm }))
}

/// HKDF (RFC 5869) over SHA-256 or SHA-384.
#[derive(Debug, Clone, Copy)]
struct HkdfImpl {
    algorithm: KdfAlgorithm,
}

impl Kdf for HkdfImpl {
    fn extract(&self, salt: &[u8], ikm: &[u8]) -> Vec<u8> {
        match self.algorithm {
            KdfAlgorithm::HkdfSha256 => SimpleHkdf::<Sha256>::extract(Some(salt), ikm).0.to_vec(),
            KdfAlgorithm::HkdfSha384 => SimpleHkdf::<Sha384>::extract(Some(salt), ikm).0.to_vec(),
        }
    }

    fn expand(&self, prk: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>> {
        if length > self.max_output_size() {
            return Err(Error::InvalidLength);
        }
        let mut okm = vec![0u8; length];
        match self.algorithm {
            KdfAlgorithm::HkdfSha256 => SimpleHkdf::<Sha256>::from_prk(prk)
                .map_err(|_| Error::InvalidKeySize {
                    expected: 32,
                    actual: prk.len(),
                })?
                .expand(info, &mut okm)
                .map_err(|_| Error::InvalidLength)?,
            KdfAlgorithm::HkdfSha384 => SimpleHkdf::<Sha384>::from_prk(prk)
                .map_err(|_| Error::InvalidKeySize {
                    expected: 48,
                    actual: prk.len(),
                })?
                .expand(info, &mut okm)
                .map_err(|_| Error::InvalidLength)?,
        }
        Ok(okm)
    }

    fn algorithm(&self) -> KdfAlgorithm {
        self.algorithm
    }
}
