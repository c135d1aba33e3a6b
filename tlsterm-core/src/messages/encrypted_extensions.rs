//! EncryptedExtensions message (RFC 8446 Section 4.3.1).

use crate::codec::expect_end;
use crate::error::Result;
use crate::extensions::Extensions;
use crate::protocol::HandshakeType;
use bytes::BytesMut;

/// First message under the handshake keys.
///
/// Nothing is negotiated here, so the server always sends an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedExtensions {
    /// Extensions
    pub extensions: Extensions,
}

impl EncryptedExtensions {
    pub fn new(extensions: Extensions) -> Self {
        Self { extensions }
    }

    /// Body: a u16-prefixed extension block.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.extensions.encode(&mut buf)?;
        Ok(buf.to_vec())
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut data = data;
        let extensions = Extensions::decode(&mut data, HandshakeType::EncryptedExtensions)?;
        expect_end(data, "EncryptedExtensions")?;
        Ok(Self { extensions })
    }
}
