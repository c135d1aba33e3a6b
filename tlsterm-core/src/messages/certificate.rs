//! Certificate message (RFC 8446 Section 4.4.2).

use crate::codec::{expect_end, put_vec_u24, put_vec_u8, read_vec_u24, read_vec_u8};
use crate::error::{Error, Result};
use crate::extensions::Extensions;
use crate::protocol::HandshakeType;
use bytes::BytesMut;

/// Certificate entry with extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntry {
    /// Certificate data (DER-encoded X.509)
    pub cert_data: Vec<u8>,

    /// Extensions for this certificate (always empty when sent by this server)
    pub extensions: Extensions,
}

/// Certificate message.
///
/// ```text
/// struct {
///     opaque certificate_request_context<0..2^8-1>;
///     CertificateEntry certificate_list<0..2^24-1>;
/// } Certificate;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Certificate request context (0-length for server auth)
    pub certificate_request_context: Vec<u8>,

    /// Certificate chain, leaf first
    pub certificate_list: Vec<CertificateEntry>,
}

impl Certificate {
    /// Create a server Certificate message from a DER chain.
    pub fn new(cert_list: Vec<Vec<u8>>) -> Self {
        let certificate_list = cert_list
            .into_iter()
            .map(|cert_data| CertificateEntry {
                cert_data,
                extensions: Extensions::new(),
            })
            .collect();

        Self {
            certificate_request_context: Vec::new(),
            certificate_list,
        }
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        put_vec_u8(&mut buf, &self.certificate_request_context)?;

        let mut list = BytesMut::new();
        for entry in &self.certificate_list {
            put_vec_u24(&mut list, &entry.cert_data)?;
            entry.extensions.encode(&mut list)?;
        }
        put_vec_u24(&mut buf, &list)?;

        Ok(buf.to_vec())
    }

    /// Decode from bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut data = data;

        let certificate_request_context =
            read_vec_u8(&mut data, "certificate_request_context")?.to_vec();

        let mut list = read_vec_u24(&mut data, "certificate_list")?;
        let mut certificate_list = Vec::new();
        while !list.is_empty() {
            let cert_data = read_vec_u24(&mut list, "cert_data")?.to_vec();
            if cert_data.is_empty() {
                return Err(Error::DecodeError("Empty certificate".into()));
            }
            let extensions = Extensions::decode(&mut list, HandshakeType::Certificate)?;
            certificate_list.push(CertificateEntry {
                cert_data,
                extensions,
            });
        }
        expect_end(data, "Certificate")?;

        Ok(Self {
            certificate_request_context,
            certificate_list,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_wire_format() {
        let cert = Certificate::new(vec![vec![0xAB, 0xCD]]);
        let encoded = cert.encode().unwrap();
        assert_eq!(
            encoded,
            vec![
                0x00, // context
                0x00, 0x00, 0x07, // list length
                0x00, 0x00, 0x02, 0xAB, 0xCD, // cert
                0x00, 0x00, // entry extensions
            ]
        );

        let decoded = Certificate::decode(&encoded).unwrap();
        assert_eq!(decoded, cert);
    }

    #[test]
    fn test_certificate_chain_order() {
        let cert = Certificate::new(vec![vec![1; 10], vec![2; 20], vec![3; 30]]);
        let decoded = Certificate::decode(&cert.encode().unwrap()).unwrap();
        let lens: Vec<usize> = decoded
            .certificate_list
            .iter()
            .map(|e| e.cert_data.len())
            .collect();
        assert_eq!(lens, vec![10, 20, 30]);
    }

    #[test]
    fn test_certificate_list_overrun() {
        // list claims 8 bytes but only 7 follow
        let data = [0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x02, 0xAB, 0xCD, 0x00, 0x00];
        assert!(Certificate::decode(&data).is_err());
    }
}
