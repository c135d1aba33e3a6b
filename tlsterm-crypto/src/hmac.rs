//! Keyed MACs.

use crate::HashAlgorithm;

/// An in-progress HMAC, keyed when the provider creates it.
///
/// Finished verify_data is one of these (RFC 8446 Section 4.4.4).
pub trait Hmac: Send {
    /// Absorb `data`.
    fn update(&mut self, data: &[u8]);

    /// Consume the state and return the tag.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Compare against `tag` without data-dependent timing.
    fn verify(self: Box<Self>, tag: &[u8]) -> bool {
        use subtle::ConstantTimeEq;
        let computed = self.finalize();
        computed.ct_eq(tag).into()
    }

    /// Underlying digest.
    fn algorithm(&self) -> HashAlgorithm;

    /// Tag length in bytes.
    fn output_size(&self) -> usize {
        self.algorithm().output_size()
    }
}
