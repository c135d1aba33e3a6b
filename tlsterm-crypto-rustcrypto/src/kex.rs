//! Key exchange implementations using `x25519-dalek`.

use std::sync::Arc;

use tlsterm_crypto::{
    key_exchange::{KeyExchangeAlgorithm, PrivateKey, PublicKey, SharedSecret},
    Error, KeyExchange, Random, Result,
};
use zeroize::Zeroizing;

/// Create a key exchange instance for the specified algorithm.
///
/// Ephemeral private keys are drawn from `random`.
pub fn create_key_exchange(
    algorithm: KeyExchangeAlgorithm,
    random: Arc<dyn Random>,
) -> Result<Box<dyn KeyExchange>> {
    match algorithm {
        KeyExchangeAlgorithm::X25519 => Ok(Box::new(X25519Kex { random })),
    }
}

/// X25519 Elliptic Curve Diffie-Hellman key exchange (RFC 7748).
///
/// - Key size: 32 bytes
/// - Shared secret size: 32 bytes
///
/// The 32 random bytes are clamped by the scalar multiplication, so any
/// byte string is a valid private key.
struct X25519Kex {
    random: Arc<dyn Random>,
}

impl KeyExchange for X25519Kex {
    fn generate_keypair(&self) -> Result<(PrivateKey, PublicKey)> {
        let mut seed = Zeroizing::new([0u8; 32]);
        self.random.fill(&mut seed[..])?;

        let secret = x25519_dalek::StaticSecret::from(*seed);
        let public = x25519_dalek::PublicKey::from(&secret);

        Ok((
            PrivateKey::from_bytes(secret.to_bytes().to_vec()),
            PublicKey::from_bytes(public.as_bytes().to_vec()),
        ))
    }

    fn exchange(&self, private_key: &PrivateKey, peer_public_key: &[u8]) -> Result<SharedSecret> {
        let secret_bytes: [u8; 32] = private_key
            .as_bytes()
            .try_into()
            .map_err(|_| Error::InvalidPrivateKey)?;
        let peer_bytes: [u8; 32] = peer_public_key
            .try_into()
            .map_err(|_| Error::InvalidPublicKey)?;

        let secret = x25519_dalek::StaticSecret::from(secret_bytes);
        let peer = x25519_dalek::PublicKey::from(peer_bytes);
        let shared = secret.diffie_hellman(&peer);

        // All-zero output means the peer sent a small-order point.
        if !shared.was_contributory() {
            return Err(Error::KeyExchangeFailed);
        }

        Ok(SharedSecret::from_bytes(shared.as_bytes().to_vec()))
    }

    fn algorithm(&self) -> KeyExchangeAlgorithm {
        KeyExchangeAlgorithm::X25519
    }
}
