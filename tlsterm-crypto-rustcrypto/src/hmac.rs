//! HMAC implementations using the `hmac` crate.

use hmac::{Mac, SimpleHmac};
use sha2::{Sha256, Sha384};
use tlsterm_crypto::{Error, HashAlgorithm, Hmac, Result};

/// Create an HMAC instance keyed with `key`.
pub fn create_hmac(algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
    let state = match algorithm {
        HashAlgorithm::Sha256 => MacState::Sha256(
            SimpleHmac::<Sha256>::new_from_slice(key).map_err(|_| Error::InvalidLength)?,
        ),
        HashAlgorithm::Sha384 => MacState::Sha384(
            SimpleHmac::<Sha384>::new_from_slice(key).map_err(|_| Error::InvalidLength)?,
        ),
    };
    Ok(Box::new(HmacImpl { state }))
}

enum MacState {
    Sha256(SimpleHmac<Sha256>),
    Sha384(SimpleHmac<Sha384>),
}

struct HmacImpl {
    state: MacState,
}

impl Hmac for HmacImpl {
    fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            MacState::Sha256(m) => m.update(data),
            MacState::Sha384(m) => m.update(data),
        }
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        match self.state {
            MacState::Sha256(m) => m.finalize().into_bytes().to_vec(),
            MacState::Sha384(m) => m.finalize().into_bytes().to_vec(),
        }
    }

    fn verify(self: Box<Self>, tag: &[u8]) -> bool {
        match self.state {
            MacState::Sha256(m) => m.verify_slice(tag).is_ok(),
            MacState::Sha384(m) => m.verify_slice(tag).is_ok(),
        }
    }

    fn algorithm(&self) -> HashAlgorithm {
        match self.state {
            MacState::Sha256(_) => HashAlgorithm::Sha256,
            MacState::Sha384(_) => HashAlgorithm::Sha384,
        }
    }
}
