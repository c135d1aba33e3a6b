//! Finished message (RFC 8446 Section 4.4.4).

use crate::error::{Error, Result};

/// Finished: the HMAC of the transcript under the sender's finished key.
///
/// The body is just `verify_data`; its length is the suite's hash length,
/// which the verifier enforces by comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    /// HMAC output
    pub verify_data: Vec<u8>,
}

impl Finished {
    pub fn new(verify_data: Vec<u8>) -> Self {
        Self { verify_data }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.verify_data.clone())
    }

    pub fn decode(body: &[u8]) -> Result<Self> {
        match body {
            [] => Err(Error::DecodeError("Finished without verify_data".into())),
            _ => Ok(Self::new(body.to_vec())),
        }
    }
}
