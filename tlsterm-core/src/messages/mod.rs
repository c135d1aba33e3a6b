//! TLS handshake messages.
//!
//! Every message travels inside a 4-byte header:
//!
//! ```text
//! struct {
//!     HandshakeType msg_type;    /* handshake type */
//!     uint24 length;             /* remaining bytes in message */
//!     select (Handshake.msg_type) { ... };
//! } Handshake;
//! ```

pub mod certificate;
pub mod certificate_verify;
pub mod client_hello;
pub mod encrypted_extensions;
pub mod finished;
pub mod server_hello;

pub use certificate::{Certificate, CertificateEntry};
pub use certificate_verify::CertificateVerify;
pub use client_hello::ClientHello;
pub use encrypted_extensions::EncryptedExtensions;
pub use finished::Finished;
pub use server_hello::ServerHello;

use crate::codec::put_u24;
use crate::error::{Error, Result};
use crate::protocol::HandshakeType;
use bytes::{BufMut, BytesMut};

/// Handshake header size (type + 24-bit length).
pub const HANDSHAKE_HEADER_SIZE: usize = 4;

/// Largest handshake message accepted from a peer.
pub const MAX_HANDSHAKE_SIZE: usize = 64 * 1024;

/// A handshake message typed by its `msg_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeMessage {
    /// ClientHello (1)
    ClientHello(ClientHello),
    /// ServerHello (2)
    ServerHello(ServerHello),
    /// EncryptedExtensions (8)
    EncryptedExtensions(EncryptedExtensions),
    /// Certificate (11)
    Certificate(Certificate),
    /// CertificateVerify (15)
    CertificateVerify(CertificateVerify),
    /// Finished (20)
    Finished(Finished),
    /// Any other handshake type, body kept verbatim
    Opaque {
        /// Wire message type
        msg_type: u8,
        /// Undecoded body
        body: Vec<u8>,
    },
}

impl HandshakeMessage {
    /// Wire message type.
    pub fn msg_type(&self) -> u8 {
        match self {
            HandshakeMessage::ClientHello(_) => HandshakeType::ClientHello.to_u8(),
            HandshakeMessage::ServerHello(_) => HandshakeType::ServerHello.to_u8(),
            HandshakeMessage::EncryptedExtensions(_) => HandshakeType::EncryptedExtensions.to_u8(),
            HandshakeMessage::Certificate(_) => HandshakeType::Certificate.to_u8(),
            HandshakeMessage::CertificateVerify(_) => HandshakeType::CertificateVerify.to_u8(),
            HandshakeMessage::Finished(_) => HandshakeType::Finished.to_u8(),
            HandshakeMessage::Opaque { msg_type, .. } => *msg_type,
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            HandshakeMessage::ClientHello(_) => "ClientHello",
            HandshakeMessage::ServerHello(_) => "ServerHello",
            HandshakeMessage::EncryptedExtensions(_) => "EncryptedExtensions",
            HandshakeMessage::Certificate(_) => "Certificate",
            HandshakeMessage::CertificateVerify(_) => "CertificateVerify",
            HandshakeMessage::Finished(_) => "Finished",
            HandshakeMessage::Opaque { .. } => "Opaque",
        }
    }

    /// Encode the body without the handshake header.
    pub fn encode_body(&self) -> Result<Vec<u8>> {
        match self {
            HandshakeMessage::ClientHello(m) => m.encode(),
            HandshakeMessage::ServerHello(m) => m.encode(),
            HandshakeMessage::EncryptedExtensions(m) => m.encode(),
            HandshakeMessage::Certificate(m) => m.encode(),
            HandshakeMessage::CertificateVerify(m) => m.encode(),
            HandshakeMessage::Finished(m) => m.encode(),
            HandshakeMessage::Opaque { body, .. } => Ok(body.clone()),
        }
    }

    /// Encode with the 4-byte handshake header. These are the bytes that
    /// enter the transcript.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = self.encode_body()?;
        let mut buf = BytesMut::with_capacity(HANDSHAKE_HEADER_SIZE + body.len());
        buf.put_u8(self.msg_type());
        put_u24(&mut buf, body.len())?;
        buf.put_slice(&body);
        Ok(buf.to_vec())
    }

    /// Decode a body for a given message type. Unknown types never fail.
    pub fn decode_body(msg_type: u8, body: &[u8]) -> Result<Self> {
        let message = match HandshakeType::from_u8(msg_type) {
            Some(HandshakeType::ClientHello) => {
                HandshakeMessage::ClientHello(ClientHello::decode(body)?)
            },
            Some(HandshakeType::ServerHello) => {
                HandshakeMessage::ServerHello(ServerHello::decode(body)?)
            },
            Some(HandshakeType::EncryptedExtensions) => {
                HandshakeMessage::EncryptedExtensions(EncryptedExtensions::decode(body)?)
            },
            Some(HandshakeType::Certificate) => {
                HandshakeMessage::Certificate(Certificate::decode(body)?)
            },
            Some(HandshakeType::CertificateVerify) => {
                HandshakeMessage::CertificateVerify(CertificateVerify::decode(body)?)
            },
            Some(HandshakeType::Finished) => HandshakeMessage::Finished(Finished::decode(body)?),
            _ => HandshakeMessage::Opaque {
                msg_type,
                body: body.to_vec(),
            },
        };
        Ok(message)
    }

    /// Decode one complete message with its header. `data` must hold
    /// exactly one message.
    pub fn decode(data: &[u8]) -> Result<Self> {
        match split_message(data)? {
            Some((msg_type, len)) if data.len() == HANDSHAKE_HEADER_SIZE + len => {
                Self::decode_body(msg_type, &data[HANDSHAKE_HEADER_SIZE..])
            },
            _ => Err(Error::DecodeError("Handshake length mismatch".into())),
        }
    }
}

/// Read a handshake header. Returns `None` until the header and the whole
/// body are buffered.
fn split_message(data: &[u8]) -> Result<Option<(u8, usize)>> {
    if data.len() < HANDSHAKE_HEADER_SIZE {
        return Ok(None);
    }
    let len = ((data[1] as usize) << 16) | ((data[2] as usize) << 8) | data[3] as usize;
    if len > MAX_HANDSHAKE_SIZE {
        return Err(Error::DecodeError(format!(
            "Handshake message of {} bytes exceeds limit",
            len
        )));
    }
    if data.len() < HANDSHAKE_HEADER_SIZE + len {
        return Ok(None);
    }
    Ok(Some((data[0], len)))
}

/// Reassembles handshake messages from record fragments.
///
/// A record may carry several messages and a message may span several
/// records; the buffer hands out one complete message at a time along
/// with its exact wire bytes.
#[derive(Debug, Default)]
pub struct HandshakeBuffer {
    buf: Vec<u8>,
}

impl HandshakeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the plaintext of a handshake record.
    pub fn extend(&mut self, fragment: &[u8]) {
        self.buf.extend_from_slice(fragment);
    }

    /// Whether a partial message is pending.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard any buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Take the next complete message and its raw bytes, if any.
    pub fn next_message(&mut self) -> Result<Option<(HandshakeMessage, Vec<u8>)>> {
        let Some((msg_type, len)) = split_message(&self.buf)? else {
            return Ok(None);
        };
        let raw: Vec<u8> = self.buf.drain(..HANDSHAKE_HEADER_SIZE + len).collect();
        let message = HandshakeMessage::decode_body(msg_type, &raw[HANDSHAKE_HEADER_SIZE..])?;
        Ok(Some((message, raw)))
    }
}
