//! ClientHello message (RFC 8446 Section 4.1.2).

use crate::cipher::CipherSuite;
use crate::codec::{
    expect_end, put_vec_u16, put_vec_u8, read_bytes, read_u16, read_vec_u16, read_vec_u8,
};
use crate::error::{Error, Result};
use crate::extensions::Extensions;
use crate::protocol::{HandshakeType, ProtocolVersion};
use bytes::{BufMut, BytesMut};

/// ClientHello message.
///
/// ```text
/// struct {
///     ProtocolVersion legacy_version = 0x0303;    /* TLS v1.2 */
///     Random random;
///     opaque legacy_session_id<0..32>;
///     CipherSuite cipher_suites<2..2^16-2>;
///     opaque legacy_compression_methods<1..2^8-1>;
///     Extension extensions<8..2^16-1>;
/// } ClientHello;
/// ```
///
/// Cipher suites are kept as raw code points so unknown and GREASE values
/// survive decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    /// Legacy version (always 0x0303 for TLS 1.3)
    pub legacy_version: ProtocolVersion,

    /// Random bytes (32 bytes)
    pub random: [u8; 32],

    /// Legacy session ID, echoed back by the server
    pub legacy_session_id: Vec<u8>,

    /// Cipher suite code points offered by the client
    pub cipher_suites: Vec<u16>,

    /// Legacy compression methods (must be [0] for TLS 1.3)
    pub legacy_compression_methods: Vec<u8>,

    /// Extensions
    pub extensions: Extensions,
}

impl ClientHello {
    /// Create a new ClientHello.
    pub fn new(random: [u8; 32], cipher_suites: Vec<u16>) -> Self {
        Self {
            legacy_version: ProtocolVersion::Tls12,
            random,
            legacy_session_id: Vec::new(),
            cipher_suites,
            legacy_compression_methods: vec![0],
            extensions: Extensions::new(),
        }
    }

    /// Set the legacy session ID (for compatibility mode).
    pub fn with_session_id(mut self, session_id: Vec<u8>) -> Self {
        self.legacy_session_id = session_id;
        self
    }

    /// Set the extensions.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Whether the client offered `suite`.
    pub fn offers(&self, suite: CipherSuite) -> bool {
        self.cipher_suites.contains(&suite.to_u16())
    }

    /// Encode the ClientHello body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();

        buf.put_u16(self.legacy_version.to_u16());
        buf.put_slice(&self.random);

        if self.legacy_session_id.len() > 32 {
            return Err(Error::InternalError("Session ID too long".into()));
        }
        put_vec_u8(&mut buf, &self.legacy_session_id)?;

        let mut suites = BytesMut::with_capacity(self.cipher_suites.len() * 2);
        for suite in &self.cipher_suites {
            suites.put_u16(*suite);
        }
        put_vec_u16(&mut buf, &suites)?;

        put_vec_u8(&mut buf, &self.legacy_compression_methods)?;
        self.extensions.encode(&mut buf)?;

        Ok(buf.to_vec())
    }

    /// Decode and validate a ClientHello body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut data = data;

        let version_raw = read_u16(&mut data, "legacy_version")?;
        let legacy_version = match ProtocolVersion::from_u16(version_raw) {
            Some(ProtocolVersion::Tls12) => ProtocolVersion::Tls12,
            _ => {
                return Err(Error::DecodeError(format!(
                    "ClientHello legacy_version {:#06x}",
                    version_raw
                )))
            },
        };

        let mut random = [0u8; 32];
        random.copy_from_slice(read_bytes(&mut data, 32, "random")?);

        let legacy_session_id = read_vec_u8(&mut data, "legacy_session_id")?.to_vec();
        if legacy_session_id.len() > 32 {
            return Err(Error::DecodeError("Session ID too long".into()));
        }

        let mut suites = read_vec_u16(&mut data, "cipher_suites")?;
        if suites.is_empty() || suites.len() % 2 != 0 {
            return Err(Error::DecodeError("Invalid cipher suites length".into()));
        }
        let mut cipher_suites = Vec::with_capacity(suites.len() / 2);
        while !suites.is_empty() {
            cipher_suites.push(read_u16(&mut suites, "cipher_suite")?);
        }

        let legacy_compression_methods =
            read_vec_u8(&mut data, "legacy_compression_methods")?.to_vec();
        if legacy_compression_methods != [0] {
            return Err(Error::DecodeError(
                "Compression methods must be exactly [null]".into(),
            ));
        }

        let extensions = Extensions::decode(&mut data, HandshakeType::ClientHello)?;
        expect_end(data, "ClientHello")?;

        Ok(Self {
            legacy_version,
            random,
            legacy_session_id,
            cipher_suites,
            legacy_compression_methods,
            extensions,
        })
    }
}
