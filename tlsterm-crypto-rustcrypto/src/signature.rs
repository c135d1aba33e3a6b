//! RSA-PSS signatures using the `rsa` crate.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::pss;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tlsterm_crypto::{Error, Random, Result, Signature, SignatureAlgorithm};
use zeroize::Zeroizing;

/// Create a signature instance for the specified algorithm.
///
/// PSS salts are drawn from `random`.
pub fn create_signature(
    algorithm: SignatureAlgorithm,
    random: Arc<dyn Random>,
) -> Result<Box<dyn Signature>> {
    match algorithm {
        SignatureAlgorithm::RsaPssRsaeSha256 => Ok(Box::new(RsaPssSha256 { random })),
    }
}

/// RSASSA-PSS with SHA-256, MGF1-SHA-256 and a 32-byte salt (RFC 8446 `rsa_pss_rsae_sha256`).
///
/// Signing keys are PKCS#8 or PKCS#1 DER; verifying keys are SPKI or PKCS#1 DER.
struct RsaPssSha256 {
    random: Arc<dyn Random>,
}

fn parse_private_key(der: &[u8]) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_der(der)
        .or_else(|_| RsaPrivateKey::from_pkcs1_der(der))
        .map_err(|_| Error::InvalidPrivateKey)
}

fn parse_public_key(der: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(der)
        .or_else(|_| RsaPublicKey::from_pkcs1_der(der))
        .map_err(|_| Error::InvalidPublicKey)
}

impl Signature for RsaPssSha256 {
    fn sign(&self, signing_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        let key = parse_private_key(signing_key)?;
        let salt = Zeroizing::new(self.random.generate(self.algorithm().salt_len())?);

        let mut rng = SaltRng {
            salt: &salt,
            offset: 0,
        };
        let signer = pss::SigningKey::<Sha256>::new(key);
        let signature = signer
            .try_sign_with_rng(&mut rng, message)
            .map_err(|e| Error::CryptoError(format!("RSA-PSS signing failed: {}", e)))?;

        Ok(signature.to_vec())
    }

    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        let key = parse_public_key(verifying_key)?;
        let verifier = pss::VerifyingKey::<Sha256>::new(key);
        let signature =
            pss::Signature::try_from(signature).map_err(|_| Error::SignatureVerificationFailed)?;

        verifier
            .verify(message, &signature)
            .map_err(|_| Error::SignatureVerificationFailed)
    }

    fn check_signing_key(&self, signing_key: &[u8]) -> Result<()> {
        parse_private_key(signing_key).map(drop)
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::RsaPssRsaeSha256
    }
}

/// Replays a pre-drawn salt to the PSS encoder, then falls back to the OS.
///
/// The encoder requests exactly one salt-length draw, so a deterministic
/// `Random` yields a deterministic signature.
struct SaltRng<'a> {
    salt: &'a [u8],
    offset: usize,
}

impl RngCore for SaltRng<'_> {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let available = &self.salt[self.offset..];
        let n = available.len().min(dest.len());
        dest[..n].copy_from_slice(&available[..n]);
        self.offset += n;
        if n < dest.len() {
            OsRng.fill_bytes(&mut dest[n..]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for SaltRng<'_> {}
