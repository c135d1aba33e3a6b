//! TLS extensions.
//!
//! Only `supported_versions` and `key_share` are interpreted. Every other
//! extension is kept as [`Extension::Opaque`] so it re-encodes byte for byte.

use bytes::{BufMut, BytesMut};

use crate::codec::{put_vec_u16, put_vec_u8, read_u16, read_vec_u16, read_vec_u8};
use crate::error::{Error, Result};
use crate::protocol::{ExtensionType, HandshakeType, ProtocolVersion};

/// X25519 named group code point.
pub const GROUP_X25519: u16 = 0x001D;

/// One `KeyShareEntry` (RFC 8446 Section 4.2.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    /// Named group
    pub group: u16,

    /// Public key bytes
    pub key_exchange: Vec<u8>,
}

impl KeyShareEntry {
    /// Create a new key share entry.
    pub fn new(group: u16, key_exchange: Vec<u8>) -> Self {
        Self {
            group,
            key_exchange,
        }
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u16(self.group);
        put_vec_u16(buf, &self.key_exchange)
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        let group = read_u16(buf, "key share group")?;
        let key_exchange = read_vec_u16(buf, "key share")?.to_vec();
        if key_exchange.is_empty() {
            return Err(Error::DecodeError("Empty key share".into()));
        }
        Ok(Self {
            group,
            key_exchange,
        })
    }
}

/// A single extension, typed by where it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// supported_versions as sent by a client: a list of versions
    SupportedVersions(Vec<u16>),

    /// supported_versions as sent by a server: the selected version
    SelectedVersion(u16),

    /// key_share in a ClientHello
    KeyShareClient(Vec<KeyShareEntry>),

    /// key_share in a ServerHello
    KeyShareServer(KeyShareEntry),

    /// Anything else, preserved verbatim
    Opaque {
        /// Extension type code point
        extension_type: u16,
        /// Extension payload
        data: Vec<u8>,
    },
}

impl Extension {
    /// Wire code point of this extension.
    pub fn extension_type(&self) -> u16 {
        match self {
            Extension::SupportedVersions(_) | Extension::SelectedVersion(_) => {
                ExtensionType::SupportedVersions.to_u16()
            },
            Extension::KeyShareClient(_) | Extension::KeyShareServer(_) => {
                ExtensionType::KeyShare.to_u16()
            },
            Extension::Opaque { extension_type, .. } => *extension_type,
        }
    }

    /// Encode the extension, including its type and length header.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        let mut body = BytesMut::new();
        match self {
            Extension::SupportedVersions(versions) => {
                let mut list = BytesMut::with_capacity(versions.len() * 2);
                for version in versions {
                    list.put_u16(*version);
                }
                put_vec_u8(&mut body, &list)?;
            },
            Extension::SelectedVersion(version) => body.put_u16(*version),
            Extension::KeyShareClient(entries) => {
                let mut list = BytesMut::new();
                for entry in entries {
                    entry.encode(&mut list)?;
                }
                put_vec_u16(&mut body, &list)?;
            },
            Extension::KeyShareServer(entry) => entry.encode(&mut body)?,
            Extension::Opaque { data, .. } => body.put_slice(data),
        }

        buf.put_u16(self.extension_type());
        put_vec_u16(buf, &body)
    }

    /// Decode one extension. `context` selects the client or server form
    /// of the interpreted extensions.
    pub fn decode(buf: &mut &[u8], context: HandshakeType) -> Result<Self> {
        let extension_type = read_u16(buf, "extension type")?;
        let mut body = read_vec_u16(buf, "extension data")?;

        let ext = match (ExtensionType::from_u16(extension_type), context) {
            (Some(ExtensionType::SupportedVersions), HandshakeType::ClientHello) => {
                let mut list = read_vec_u8(&mut body, "supported_versions")?;
                if list.is_empty() || list.len() % 2 != 0 {
                    return Err(Error::DecodeError(
                        "Invalid supported_versions length".into(),
                    ));
                }
                let mut versions = Vec::with_capacity(list.len() / 2);
                while !list.is_empty() {
                    versions.push(read_u16(&mut list, "supported_versions")?);
                }
                Extension::SupportedVersions(versions)
            },
            (Some(ExtensionType::SupportedVersions), HandshakeType::ServerHello) => {
                Extension::SelectedVersion(read_u16(&mut body, "selected version")?)
            },
            (Some(ExtensionType::KeyShare), HandshakeType::ClientHello) => {
                let mut list = read_vec_u16(&mut body, "client_shares")?;
                let mut entries = Vec::new();
                while !list.is_empty() {
                    entries.push(KeyShareEntry::decode(&mut list)?);
                }
                Extension::KeyShareClient(entries)
            },
            (Some(ExtensionType::KeyShare), HandshakeType::ServerHello) => {
                Extension::KeyShareServer(KeyShareEntry::decode(&mut body)?)
            },
            _ => {
                let data = body.to_vec();
                body = &[];
                Extension::Opaque {
                    extension_type,
                    data,
                }
            },
        };

        if !body.is_empty() {
            return Err(Error::DecodeError(format!(
                "Extension {:#06x} has {} trailing bytes",
                extension_type,
                body.len()
            )));
        }
        Ok(ext)
    }
}

/// Ordered extension list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    extensions: Vec<Extension>,
}

impl Extensions {
    /// Create a new empty extension list.
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    /// Add an extension.
    pub fn add(&mut self, extension: Extension) {
        self.extensions.push(extension);
    }

    /// Get an extension by code point.
    pub fn get(&self, extension_type: u16) -> Option<&Extension> {
        self.extensions
            .iter()
            .find(|e| e.extension_type() == extension_type)
    }

    /// Iterate in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter()
    }

    /// Get the number of extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Check if the extension list is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Versions offered in a client `supported_versions` extension.
    pub fn supported_versions(&self) -> Option<&[u16]> {
        self.extensions.iter().find_map(|e| match e {
            Extension::SupportedVersions(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    /// Whether the client offered TLS 1.3 in `supported_versions`.
    pub fn offers_tls13(&self) -> bool {
        self.supported_versions()
            .map(|v| v.contains(&ProtocolVersion::Tls13.to_u16()))
            .unwrap_or(false)
    }

    /// The client key share for `group`, if one was sent.
    pub fn client_key_share(&self, group: u16) -> Option<&KeyShareEntry> {
        self.extensions.iter().find_map(|e| match e {
            Extension::KeyShareClient(entries) => entries.iter().find(|s| s.group == group),
            _ => None,
        })
    }

    /// The server key share, if present.
    pub fn server_key_share(&self) -> Option<&KeyShareEntry> {
        self.extensions.iter().find_map(|e| match e {
            Extension::KeyShareServer(entry) => Some(entry),
            _ => None,
        })
    }

    /// Encode with the two-byte list length prefix.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        let mut list = BytesMut::new();
        for ext in &self.extensions {
            ext.encode(&mut list)?;
        }
        put_vec_u16(buf, &list)
    }

    /// Decode a length-prefixed extension block.
    ///
    /// Duplicate extension types are rejected (RFC 8446 Section 4.2).
    pub fn decode(buf: &mut &[u8], context: HandshakeType) -> Result<Self> {
        let mut list = read_vec_u16(buf, "extensions")?;
        let mut extensions: Vec<Extension> = Vec::new();

        while !list.is_empty() {
            let ext = Extension::decode(&mut list, context)?;
            let ext_type = ext.extension_type();
            if extensions.iter().any(|e| e.extension_type() == ext_type) {
                return Err(Error::DecodeError(format!(
                    "Duplicate extension {:#06x}",
                    ext_type
                )));
            }
            extensions.push(ext);
        }

        Ok(Self { extensions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_one(ext: &Extension) -> Vec<u8> {
        let mut buf = BytesMut::new();
        ext.encode(&mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_supported_versions_wire_format() {
        let ext = Extension::SupportedVersions(vec![0x0304, 0x0303]);
        assert_eq!(
            encode_one(&ext),
            vec![0x00, 0x2b, 0x00, 0x05, 0x04, 0x03, 0x04, 0x03, 0x03]
        );

        let server = Extension::SelectedVersion(0x0304);
        assert_eq!(encode_one(&server), vec![0x00, 0x2b, 0x00, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_key_share_decode_by_context() {
        let entry = KeyShareEntry::new(GROUP_X25519, vec![0x11; 32]);
        let client = encode_one(&Extension::KeyShareClient(vec![entry.clone()]));
        let server = encode_one(&Extension::KeyShareServer(entry.clone()));

        let decoded = Extension::decode(&mut &client[..], HandshakeType::ClientHello).unwrap();
        assert_eq!(decoded, Extension::KeyShareClient(vec![entry.clone()]));

        let decoded = Extension::decode(&mut &server[..], HandshakeType::ServerHello).unwrap();
        assert_eq!(decoded, Extension::KeyShareServer(entry));
    }

    #[test]
    fn test_unknown_extension_is_opaque() {
        let raw = [0xfa, 0xfa, 0x00, 0x01, 0x00];
        let ext = Extension::decode(&mut &raw[..], HandshakeType::ClientHello).unwrap();
        assert_eq!(
            ext,
            Extension::Opaque {
                extension_type: 0xfafa,
                data: vec![0x00],
            }
        );
        assert_eq!(encode_one(&ext), raw.to_vec());
    }

    #[test]
    fn test_extensions_lookup() {
        let mut exts = Extensions::new();
        exts.add(Extension::SupportedVersions(vec![0x0303, 0x0304]));
        exts.add(Extension::KeyShareClient(vec![
            KeyShareEntry::new(0x0017, vec![4; 65]),
            KeyShareEntry::new(GROUP_X25519, vec![9; 32]),
        ]));

        assert!(exts.offers_tls13());
        assert_eq!(
            exts.client_key_share(GROUP_X25519).map(|s| s.key_exchange.len()),
            Some(32)
        );
        assert!(exts.client_key_share(0x0018).is_none());

        let mut buf = BytesMut::new();
        exts.encode(&mut buf).unwrap();
        let decoded = Extensions::decode(&mut &buf[..], HandshakeType::ClientHello).unwrap();
        assert_eq!(decoded, exts);
    }

    #[test]
    fn test_malformed_extensions() {
        // Declared length runs past the buffer
        let raw = [0x00, 0x2b, 0x00, 0x09, 0x02, 0x03, 0x04];
        assert!(Extension::decode(&mut &raw[..], HandshakeType::ClientHello).is_err());

        // Odd-length version list
        let raw = [0x00, 0x2b, 0x00, 0x02, 0x01, 0x03];
        assert!(Extension::decode(&mut &raw[..], HandshakeType::ClientHello).is_err());

        // Duplicate type
        let mut exts = Extensions::new();
        exts.add(Extension::Opaque {
            extension_type: 0x0a,
            data: vec![],
        });
        exts.add(Extension::Opaque {
            extension_type: 0x0a,
            data: vec![],
        });
        let mut buf = BytesMut::new();
        exts.encode(&mut buf).unwrap();
        assert!(Extensions::decode(&mut &buf[..], HandshakeType::ClientHello).is_err());
    }

    #[test]
    fn test_duplicate_key_share_rejected() {
        let share = |byte| {
            Extension::KeyShareClient(vec![KeyShareEntry::new(GROUP_X25519, vec![byte; 32])])
        };
        let mut exts = Extensions::new();
        exts.add(share(1));
        exts.add(Extension::SupportedVersions(vec![0x0304]));
        exts.add(share(2));

        let mut buf = BytesMut::new();
        exts.encode(&mut buf).unwrap();
        assert!(matches!(
            Extensions::decode(&mut &buf[..], HandshakeType::ClientHello),
            Err(Error::DecodeError(_))
        ));
    }
}
