//! Operating-system backed random number generation.

use rand::rngs::OsRng;
use rand::RngCore;
use tlsterm_crypto::{Error, Random, Result};

/// Random source drawing from the operating system via `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl Random for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|_| Error::RandomGenerationFailed)
    }
}
