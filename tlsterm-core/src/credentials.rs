//! PEM credential decoding.
//!
//! The core never touches the filesystem; it receives PEM text from whatever
//! credential source the embedding application uses and turns it into the DER
//! the handshake sends (certificates) or signs with (private key).

use crate::error::{Error, Result};
use zeroize::Zeroizing;

const CERTIFICATE_TAG: &str = "CERTIFICATE";
const PKCS8_KEY_TAG: &str = "PRIVATE KEY";
const PKCS1_KEY_TAG: &str = "RSA PRIVATE KEY";

/// Decode every `CERTIFICATE` block, leaf first.
///
/// Blocks with other tags are ignored. At least one certificate is required.
pub fn parse_certificate_chain(pem_text: &str) -> Result<Vec<Vec<u8>>> {
    let blocks = pem::parse_many(pem_text)
        .map_err(|e| Error::InvalidConfig(format!("Certificate PEM: {}", e)))?;

    let chain: Vec<Vec<u8>> = blocks
        .into_iter()
        .filter(|block| block.tag() == CERTIFICATE_TAG)
        .map(pem::Pem::into_contents)
        .collect();

    if chain.is_empty() {
        return Err(Error::InvalidConfig("No CERTIFICATE block found".into()));
    }
    for der in &chain {
        check_der_sequence(der, "CERTIFICATE")?;
    }
    Ok(chain)
}

/// Decode a PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`) block.
///
/// The DER is handed to the signature provider as is; the provider decides
/// which of the two encodings it holds.
pub fn parse_private_key(pem_text: &str) -> Result<Zeroizing<Vec<u8>>> {
    let blocks = pem::parse_many(pem_text)
        .map_err(|_| Error::InvalidConfig("Private key PEM is malformed".into()))?;

    let key = blocks
        .into_iter()
        .find(|block| matches!(block.tag(), PKCS8_KEY_TAG | PKCS1_KEY_TAG))
        .ok_or_else(|| Error::InvalidConfig("No PRIVATE KEY block found".into()))?;

    let der = Zeroizing::new(key.into_contents());
    check_der_sequence(&der, "private key")?;
    Ok(der)
}

/// Require `der` to be exactly one DER SEQUENCE.
///
/// Only the outer tag and length are checked; the contents are left to
/// whoever consumes them.
fn check_der_sequence(der: &[u8], what: &str) -> Result<()> {
    let malformed = || Error::InvalidConfig(format!("{} is not a DER SEQUENCE", what));

    let (&tag, rest) = der.split_first().ok_or_else(malformed)?;
    let (&first, rest) = rest.split_first().ok_or_else(malformed)?;
    if tag != 0x30 {
        return Err(malformed());
    }

    let (len, body) = match first {
        0..=0x7f => (first as usize, rest),
        0x81..=0x84 => {
            let count = (first & 0x7f) as usize;
            if rest.len() < count {
                return Err(malformed());
            }
            let (len_bytes, body) = rest.split_at(count);
            let len = len_bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
            (len, body)
        },
        _ => return Err(malformed()),
    };

    if len != body.len() {
        return Err(malformed());
    }
    Ok(())
}
