//! CertificateVerify message (RFC 8446 Section 4.4.3).

use crate::codec::{expect_end, put_vec_u16, read_u16, read_vec_u16};
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};
use tlsterm_crypto::SignatureAlgorithm;

/// Context string for signatures made by the server.
pub const SERVER_CONTEXT: &[u8] = b"TLS 1.3, server CertificateVerify";

/// CertificateVerify message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateVerify {
    /// Signature algorithm
    pub algorithm: SignatureAlgorithm,

    /// Signature
    pub signature: Vec<u8>,
}

impl CertificateVerify {
    /// Create a CertificateVerify carrying `signature` made with `algorithm`.
    pub fn new(algorithm: SignatureAlgorithm, signature: Vec<u8>) -> Self {
        Self {
            algorithm,
            signature,
        }
    }

    /// The bytes a server signs: 64 spaces, the context string, a zero
    /// byte, then the transcript hash through Certificate.
    pub fn server_signed_content(transcript_hash: &[u8]) -> Vec<u8> {
        let mut content = Vec::with_capacity(64 + SERVER_CONTEXT.len() + 1 + transcript_hash.len());
        content.extend_from_slice(&[0x20; 64]);
        content.extend_from_slice(SERVER_CONTEXT);
        content.push(0x00);
        content.extend_from_slice(transcript_hash);
        content
    }

    /// Encode the message body (algorithm, then a u16-prefixed signature).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        buf.put_u16(self.algorithm.to_u16());
        put_vec_u16(&mut buf, &self.signature)?;
        Ok(buf.to_vec())
    }

    /// Decode a message body. Trailing bytes are rejected.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut data = data;
        let alg_raw = read_u16(&mut data, "signature algorithm")?;
        let algorithm = SignatureAlgorithm::from_u16(alg_raw).ok_or_else(|| {
            Error::DecodeError(format!("Unknown signature algorithm {:#06x}", alg_raw))
        })?;
        let signature = read_vec_u16(&mut data, "signature")?.to_vec();
        expect_end(data, "CertificateVerify")?;
        Ok(Self {
            algorithm,
            signature,
        })
    }
}
