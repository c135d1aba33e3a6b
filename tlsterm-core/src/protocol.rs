//! Wire code points for versions, record content types, handshake message
//! types and the extensions the server interprets.

/// Protocol version code points.
///
/// Only TLS 1.3 is negotiated. The older values appear as legacy wire
/// fields: the record header and the ClientHello `legacy_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ProtocolVersion {
    /// 0x0301, common in the header of a client's first record
    Tls10 = 0x0301,
    /// 0x0302
    Tls11 = 0x0302,
    /// 0x0303, the legacy version on every TLS 1.3 record and hello
    Tls12 = 0x0303,
    /// 0x0304, only ever seen inside supported_versions
    Tls13 = 0x0304,
}

impl ProtocolVersion {
    /// Parse a version code point.
    pub const fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0x0301 => Self::Tls10,
            0x0302 => Self::Tls11,
            0x0303 => Self::Tls12,
            0x0304 => Self::Tls13,
            _ => return None,
        })
    }

    /// Code point for the wire.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Human-readable name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tls10 => "TLS 1.0",
            Self::Tls11 => "TLS 1.1",
            Self::Tls12 => "TLS 1.2",
            Self::Tls13 => "TLS 1.3",
        }
    }
}

/// Record content type (RFC 8446 Section 5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContentType {
    /// 20, sent by middlebox-compatible clients and skipped
    ChangeCipherSpec = 20,
    /// 21
    Alert = 21,
    /// 22
    Handshake = 22,
    /// 23, and the outer type of every protected record
    ApplicationData = 23,
    /// 24 (RFC 6520); recognised so it can be skipped rather than rejected
    Heartbeat = 24,
}

impl ContentType {
    /// Parse a content type byte.
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            20 => Self::ChangeCipherSpec,
            21 => Self::Alert,
            22 => Self::Handshake,
            23 => Self::ApplicationData,
            24 => Self::Heartbeat,
            _ => return None,
        })
    }

    /// Byte for the wire.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Handshake message types this server sends or accepts.
///
/// Anything else decodes as [`HandshakeMessage::Opaque`](crate::messages::HandshakeMessage::Opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandshakeType {
    /// 1
    ClientHello = 1,
    /// 2
    ServerHello = 2,
    /// 8
    EncryptedExtensions = 8,
    /// 11
    Certificate = 11,
    /// 15
    CertificateVerify = 15,
    /// 20
    Finished = 20,
}

impl HandshakeType {
    /// Parse a `msg_type` byte.
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::ClientHello,
            2 => Self::ServerHello,
            8 => Self::EncryptedExtensions,
            11 => Self::Certificate,
            15 => Self::CertificateVerify,
            20 => Self::Finished,
            _ => return None,
        })
    }

    /// Byte for the wire.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Extensions with a typed decoding. Every other extension stays opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ExtensionType {
    /// supported_versions (43)
    SupportedVersions = 43,
    /// key_share (51)
    KeyShare = 51,
}

impl ExtensionType {
    /// Parse an extension code point.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            43 => Some(Self::SupportedVersions),
            51 => Some(Self::KeyShare),
            _ => None,
        }
    }

    /// Code point for the wire.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_version() {
        assert_eq!(
            ProtocolVersion::from_u16(0x0304),
            Some(ProtocolVersion::Tls13)
        );
        assert_eq!(ProtocolVersion::Tls12.to_u16(), 0x0303);
        assert_eq!(ProtocolVersion::Tls13.name(), "TLS 1.3");
        assert_eq!(ProtocolVersion::from_u16(0x7f1c), None);
        assert!(ProtocolVersion::Tls13 > ProtocolVersion::Tls12);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(ContentType::from_u8(21), Some(ContentType::Alert));
        assert_eq!(ContentType::ApplicationData.to_u8(), 23);
        assert_eq!(ContentType::from_u8(0), None);
        assert_eq!(ContentType::from_u8(25), None);
    }

    #[test]
    fn test_handshake_type() {
        assert_eq!(HandshakeType::from_u8(15), Some(HandshakeType::CertificateVerify));
        assert_eq!(HandshakeType::Finished.to_u8(), 20);
        // KeyUpdate and NewSessionTicket are not handled.
        assert_eq!(HandshakeType::from_u8(24), None);
        assert_eq!(HandshakeType::from_u8(4), None);
    }

    #[test]
    fn test_extension_type() {
        assert_eq!(ExtensionType::from_u16(51), Some(ExtensionType::KeyShare));
        assert_eq!(ExtensionType::SupportedVersions.to_u16(), 43);
        assert_eq!(ExtensionType::from_u16(0), None);
        assert_eq!(ExtensionType::from_u16(0xfafa), None);
    }
}
