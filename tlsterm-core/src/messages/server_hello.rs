//! ServerHello message (RFC 8446 Section 4.1.3).

use crate::cipher::CipherSuite;
use crate::codec::{expect_end, put_vec_u8, read_bytes, read_u16, read_u8, read_vec_u8};
use crate::error::{Error, Result};
use crate::extensions::{Extension, Extensions, KeyShareEntry};
use crate::protocol::{HandshakeType, ProtocolVersion};
use bytes::{BufMut, BytesMut};

/// ServerHello message.
///
/// ```text
/// struct {
///     ProtocolVersion legacy_version = 0x0303;    /* TLS v1.2 */
///     Random random;
///     opaque legacy_session_id_echo<0..32>;
///     CipherSuite cipher_suite;
///     uint8 legacy_compression_method = 0;
///     Extension extensions<6..2^16-1>;
/// } ServerHello;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// Legacy version (always 0x0303 for TLS 1.3)
    pub legacy_version: ProtocolVersion,

    /// Random bytes: 4-byte timestamp followed by 28 random bytes
    pub random: [u8; 32],

    /// Legacy session ID echo (echoes client's session ID)
    pub legacy_session_id_echo: Vec<u8>,

    /// Selected cipher suite
    pub cipher_suite: CipherSuite,

    /// Extensions
    pub extensions: Extensions,
}

impl ServerHello {
    /// Create a TLS 1.3 ServerHello carrying the server key share.
    ///
    /// Extensions are `supported_versions` (0x0304) followed by `key_share`.
    pub fn new(random: [u8; 32], session_id_echo: Vec<u8>, key_share: KeyShareEntry) -> Self {
        let mut extensions = Extensions::new();
        extensions.add(Extension::SelectedVersion(ProtocolVersion::Tls13.to_u16()));
        extensions.add(Extension::KeyShareServer(key_share));

        Self {
            legacy_version: ProtocolVersion::Tls12,
            random,
            legacy_session_id_echo: session_id_echo,
            cipher_suite: CipherSuite::Aes256GcmSha384,
            extensions,
        }
    }

    /// Build the server random from a Unix timestamp and 28 random bytes.
    pub fn make_random(unix_time: u32, tail: &[u8; 28]) -> [u8; 32] {
        let mut random = [0u8; 32];
        random[..4].copy_from_slice(&unix_time.to_be_bytes());
        random[4..].copy_from_slice(tail);
        random
    }

    /// Encode the ServerHello body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();

        buf.put_u16(self.legacy_version.to_u16());
        buf.put_slice(&self.random);

        if self.legacy_session_id_echo.len() > 32 {
            return Err(Error::InternalError("Session ID too long".into()));
        }
        put_vec_u8(&mut buf, &self.legacy_session_id_echo)?;

        buf.put_u16(self.cipher_suite.to_u16());
        // legacy_compression_method
        buf.put_u8(0);

        self.extensions.encode(&mut buf)?;

        Ok(buf.to_vec())
    }

    /// Decode a ServerHello body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut data = data;

        let version_raw = read_u16(&mut data, "legacy_version")?;
        let legacy_version = ProtocolVersion::from_u16(version_raw).ok_or_else(|| {
            Error::DecodeError(format!("Unknown legacy_version {:#06x}", version_raw))
        })?;

        let mut random = [0u8; 32];
        random.copy_from_slice(read_bytes(&mut data, 32, "random")?);

        let legacy_session_id_echo = read_vec_u8(&mut data, "legacy_session_id_echo")?.to_vec();

        let suite_raw = read_u16(&mut data, "cipher_suite")?;
        let cipher_suite = CipherSuite::from_u16(suite_raw).ok_or_else(|| {
            Error::DecodeError(format!("Unknown cipher suite {:#06x}", suite_raw))
        })?;

        if read_u8(&mut data, "legacy_compression_method")? != 0 {
            return Err(Error::DecodeError("Non-null compression method".into()));
        }

        let extensions = Extensions::decode(&mut data, HandshakeType::ServerHello)?;
        expect_end(data, "ServerHello")?;

        Ok(Self {
            legacy_version,
            random,
            legacy_session_id_echo,
            cipher_suite,
            extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::GROUP_X25519;

    #[test]
    fn test_server_hello_layout() {
        let random = ServerHello::make_random(0x5f5e1000, &[7u8; 28]);
        assert_eq!(&random[..4], &[0x5f, 0x5e, 0x10, 0x00]);

        let hello = ServerHello::new(
            random,
            vec![0xAA; 32],
            KeyShareEntry::new(GROUP_X25519, vec![0x33; 32]),
        );
        let encoded = hello.encode().unwrap();

        // version + random + sid + suite + compression + extensions(2 + 6 + 40)
        assert_eq!(encoded.len(), 2 + 32 + 33 + 2 + 1 + 48);
        assert_eq!(&encoded[67..69], &[0x13, 0x02]);
        assert_eq!(encoded[69], 0x00);

        let decoded = ServerHello::decode(&encoded).unwrap();
        assert_eq!(decoded, hello);
        assert_eq!(
            decoded.extensions.server_key_share().map(|k| k.group),
            Some(GROUP_X25519)
        );
    }

    #[test]
    fn test_empty_session_id_echo() {
        let hello = ServerHello::new(
            [0u8; 32],
            Vec::new(),
            KeyShareEntry::new(GROUP_X25519, vec![1; 32]),
        );
        let encoded = hello.encode().unwrap();
        assert_eq!(encoded[34], 0);
        assert_eq!(ServerHello::decode(&encoded).unwrap(), hello);
    }
}
