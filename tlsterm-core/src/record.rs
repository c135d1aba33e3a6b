//! TLS record layer framing.
//!
//! # Record Structure (TLS 1.3)
//!
//! ```text
//! struct {
//!     ContentType type;
//!     ProtocolVersion legacy_record_version = 0x0303; // TLS 1.2 for compatibility
//!     uint16 length;
//!     opaque fragment[TLSPlaintext.length];
//! } TLSPlaintext;
//! ```
//!
//! Parsing never blocks and never drops bytes: a buffer that does not yet
//! hold a whole record yields [`RecordParse::Incomplete`].

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::{ContentType, ProtocolVersion};

/// Maximum plaintext fragment size.
pub const MAX_FRAGMENT_SIZE: usize = 16384;

/// Maximum protected record size (fragment + content type + expansion).
pub const MAX_CIPHERTEXT_SIZE: usize = MAX_FRAGMENT_SIZE + 256;

/// TLS record header size (5 bytes).
pub const RECORD_HEADER_SIZE: usize = 5;

/// A single TLS record.
///
/// The wire `length` is always `fragment.len()`; it is not stored separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsRecord {
    /// Content type
    pub content_type: ContentType,

    /// Legacy record version (0x0303 on everything this server sends)
    pub legacy_version: ProtocolVersion,

    /// Fragment data, plaintext or AEAD ciphertext
    pub fragment: Vec<u8>,
}

/// Outcome of parsing the front of a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordParse {
    /// A whole record was available; `consumed` bytes belong to it.
    Complete {
        /// The parsed record
        record: TlsRecord,
        /// Header plus fragment length
        consumed: usize,
    },

    /// More bytes are needed. Nothing was consumed.
    Incomplete,
}

impl TlsRecord {
    /// Create a record with the TLS 1.2 legacy version.
    pub fn new(content_type: ContentType, fragment: Vec<u8>) -> Self {
        Self {
            content_type,
            legacy_version: ProtocolVersion::Tls12,
            fragment,
        }
    }

    /// Fragment length as carried in the header.
    pub fn len(&self) -> usize {
        self.fragment.len()
    }

    /// Check if the fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.fragment.is_empty()
    }

    /// Encode the record to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(RECORD_HEADER_SIZE + self.fragment.len());
        self.encode_into(&mut buf)?;
        Ok(buf.to_vec())
    }

    /// Append the encoded record to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<()> {
        if self.fragment.len() > MAX_CIPHERTEXT_SIZE {
            return Err(Error::RecordOverflow(self.fragment.len()));
        }

        buf.put_u8(self.content_type.to_u8());
        buf.put_u16(self.legacy_version.to_u16());
        buf.put_u16(self.fragment.len() as u16);
        buf.put_slice(&self.fragment);

        Ok(())
    }

    /// Parse one record from the front of `data`.
    ///
    /// Header fields are validated as soon as the 5 header bytes are present,
    /// so an oversized or garbage header fails immediately instead of
    /// waiting for a body that will never arrive.
    pub fn decode(data: &[u8]) -> Result<RecordParse> {
        if data.len() < RECORD_HEADER_SIZE {
            return Ok(RecordParse::Incomplete);
        }

        let mut header = &data[..RECORD_HEADER_SIZE];
        let type_raw = header.get_u8();
        let content_type = ContentType::from_u8(type_raw)
            .ok_or_else(|| Error::DecodeError(format!("Unknown content type {}", type_raw)))?;

        let version_raw = header.get_u16();
        let legacy_version = ProtocolVersion::from_u16(version_raw).ok_or_else(|| {
            Error::DecodeError(format!("Unknown record version {:#06x}", version_raw))
        })?;

        let length = header.get_u16() as usize;
        if length > MAX_CIPHERTEXT_SIZE {
            return Err(Error::RecordOverflow(length));
        }

        if data.len() < RECORD_HEADER_SIZE + length {
            return Ok(RecordParse::Incomplete);
        }

        let fragment = data[RECORD_HEADER_SIZE..RECORD_HEADER_SIZE + length].to_vec();
        Ok(RecordParse::Complete {
            record: Self {
                content_type,
                legacy_version,
                fragment,
            },
            consumed: RECORD_HEADER_SIZE + length,
        })
    }
}

/// Split as many whole records as `data` holds.
///
/// Returns the records in order and the unconsumed tail, which the caller
/// keeps for the next read.
pub fn split_records(data: &[u8]) -> Result<(Vec<TlsRecord>, &[u8])> {
    let mut records = Vec::new();
    let mut rest = data;
    while let RecordParse::Complete { record, consumed } = TlsRecord::decode(rest)? {
        records.push(record);
        rest = &rest[consumed..];
    }
    Ok((records, rest))
}

/// Inbound byte buffer that yields whole records across arbitrary reads.
#[derive(Debug, Default)]
pub struct RecordReader {
    buf: BytesMut,
}

impl RecordReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the transport.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered, not yet consumed bytes.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Take the next whole record, if one is buffered.
    pub fn next_record(&mut self) -> Result<Option<TlsRecord>> {
        match TlsRecord::decode(&self.buf)? {
            RecordParse::Complete { record, consumed } => {
                self.buf.advance(consumed);
                Ok(Some(record))
            },
            RecordParse::Incomplete => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_encode_decode() {
        let record = TlsRecord::new(ContentType::Handshake, vec![1, 2, 3, 4]);

        let encoded = record.encode().unwrap();
        assert_eq!(encoded, vec![22, 0x03, 0x03, 0x00, 0x04, 1, 2, 3, 4]);

        match TlsRecord::decode(&encoded).unwrap() {
            RecordParse::Complete {
                record: decoded,
                consumed,
            } => {
                assert_eq!(decoded, record);
                assert_eq!(consumed, encoded.len());
            },
            RecordParse::Incomplete => panic!("expected a complete record"),
        }
    }

    #[test]
    fn test_incomplete_record() {
        assert_eq!(TlsRecord::decode(&[22, 3]).unwrap(), RecordParse::Incomplete);
        assert_eq!(
            TlsRecord::decode(&[22, 3, 3, 0, 4, 1, 2]).unwrap(),
            RecordParse::Incomplete
        );
    }

    #[test]
    fn test_invalid_record() {
        // Unknown content type
        assert!(TlsRecord::decode(&[255, 3, 3, 0, 0]).is_err());

        // Unknown version
        assert!(TlsRecord::decode(&[22, 0xFE, 0xFD, 0, 0]).is_err());

        // Overflow is reported before the body arrives
        assert_eq!(
            TlsRecord::decode(&[23, 3, 3, 0x48, 0x01]),
            Err(Error::RecordOverflow(0x4801))
        );
    }

    #[test]
    fn test_split_records() {
        let a = TlsRecord::new(ContentType::Handshake, vec![1; 3]).encode().unwrap();
        let b = TlsRecord::new(ContentType::ApplicationData, vec![2; 5])
            .encode()
            .unwrap();
        let mut data = [a, b].concat();
        data.extend_from_slice(&[23, 3, 3, 0]);

        let (records, rest) = split_records(&data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].content_type, ContentType::ApplicationData);
        assert_eq!(rest, &[23, 3, 3, 0]);
    }

    #[test]
    fn test_reader_across_reads() {
        let encoded = TlsRecord::new(ContentType::Alert, vec![1, 0]).encode().unwrap();
        let mut reader = RecordReader::new();

        for byte in &encoded[..encoded.len() - 1] {
            reader.push(&[*byte]);
            assert!(reader.next_record().unwrap().is_none());
        }
        reader.push(&encoded[encoded.len() - 1..]);

        let record = reader.next_record().unwrap().unwrap();
        assert_eq!(record.fragment, vec![1, 0]);
        assert_eq!(reader.buffered(), 0);
    }
}
