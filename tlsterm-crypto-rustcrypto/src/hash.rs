//! Hash function implementations using `sha2`.

use sha2::{Digest, Sha256, Sha384};
use tlsterm_crypto::{Hash, HashAlgorithm, Result};

/// Create a hash instance for the specified algorithm.
pub fn create_hash(algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
    let state = match algorithm {
        HashAlgorithm::Sha256 => Sha2State::Sha256(Sha256::new()),
        HashAlgorithm::Sha384 => Sha2State::Sha384(Sha384::new()),
    };
    Ok(Box::new(Sha2Hash { state }))
}

enum Sha2State {
    Sha256(Sha256),
    Sha384(Sha384),
}

/// Streaming SHA-2 digest (FIPS 180-4).
struct Sha2Hash {
    state: Sha2State,
}

impl Hash for Sha2Hash {
    fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            Sha2State::Sha256(h) => h.update(data),
            Sha2State::Sha384(h) => h.update(data),
        }
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        match self.state {
            Sha2State::Sha256(h) => h.finalize().to_vec(),
            Sha2State::Sha384(h) => h.finalize().to_vec(),
        }
    }

    fn algorithm(&self) -> HashAlgorithm {
        match self.state {
            Sha2State::Sha256(_) => HashAlgorithm::Sha256,
            Sha2State::Sha384(_) => HashAlgorithm::Sha384,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha384_empty() {
        let hash = create_hash(HashAlgorithm::Sha384).unwrap();
        assert_eq!(
            hex::encode(hash.finalize()),
            "38b060a751ac96384cd9327eb1b1e36a21fdb71114be07434c0cc7bf63f6e1da\
             274edebfe76f65fbd51ad2f14898b95b"
        );
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let mut streamed = create_hash(HashAlgorithm::Sha256).unwrap();
        streamed.update(b"hello ");
        streamed.update(b"world");
        let mut one_shot = create_hash(HashAlgorithm::Sha256).unwrap();
        one_shot.update(b"hello world");
        assert_eq!(streamed.finalize(), one_shot.finalize());
    }
}
