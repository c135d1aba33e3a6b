//! Randomness source.

use crate::Result;

/// Source of every random byte a handshake consumes.
///
/// Production sources draw from the operating system CSPRNG. Scripted
/// sources exist only to pin handshake output in tests.
pub trait Random: Send + Sync {
    /// Overwrite `dest` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns `RandomGenerationFailed` if the source cannot produce bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;

    /// `len` fresh random bytes.
    fn generate(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}
