//! TLS 1.3 Key Schedule (RFC 8446 Section 7.1).
//!
//! The TLS 1.3 key schedule uses HKDF to derive all cryptographic keys and IVs
//! from the shared secret established during the handshake. Everything here
//! runs over SHA-384, the hash of `TLS_AES_256_GCM_SHA384`.
//!
//! ```text
//!              0
//!              |
//!              v
//!      0 ->  HKDF-Extract = Early Secret
//!              |
//!              v
//!        Derive-Secret(., "derived", "")
//!              |
//!              v
//!   (EC)DHE -> HKDF-Extract = Handshake Secret
//!              |
//!              +-----> Derive-Secret(., "c hs traffic",
//!              |                     ClientHello...ServerHello)
//!              |                     = client_handshake_traffic_secret
//!              |
//!              +-----> Derive-Secret(., "s hs traffic",
//!              |                     ClientHello...ServerHello)
//!              |                     = server_handshake_traffic_secret
//!              v
//!        Derive-Secret(., "derived", "")
//!              |
//!              v
//!   0 -> HKDF-Extract = Master Secret
//!              |
//!              +-----> Derive-Secret(., "c ap traffic",
//!              |                     ClientHello...server Finished)
//!              |                     = client_application_traffic_secret_0
//!              |
//!              +-----> Derive-Secret(., "s ap traffic",
//!                                    ClientHello...server Finished)
//!                                    = server_application_traffic_secret_0
//! ```

use crate::cipher::CipherSuite;
use crate::error::{Error, Result};
use tlsterm_crypto::CryptoProvider;
use zeroize::Zeroizing;

/// The only suite this server negotiates.
pub const SUITE: CipherSuite = CipherSuite::Aes256GcmSha384;

/// Secret length (SHA-384 output).
pub const HASH_LEN: usize = SUITE.hash_length();

/// HKDF-Extract(salt, ikm) = HMAC-SHA384(salt, ikm).
pub fn hkdf_extract(provider: &dyn CryptoProvider, salt: &[u8], ikm: &[u8]) -> Result<Vec<u8>> {
    let kdf = provider.kdf(SUITE.kdf_algorithm())?;
    Ok(kdf.extract(salt, ikm))
}

/// HKDF-Expand (RFC 5869) truncated to `length` bytes.
pub fn hkdf_expand(
    provider: &dyn CryptoProvider,
    prk: &[u8],
    info: &[u8],
    length: usize,
) -> Result<Vec<u8>> {
    let kdf = provider.kdf(SUITE.kdf_algorithm())?;
    Ok(kdf.expand(prk, info, length)?)
}

/// HKDF-Expand-Label (RFC 8446 Section 7.1).
///
/// ```text
/// struct {
///     uint16 length = Length;
///     opaque label<7..255> = "tls13 " + Label;
///     opaque context<0..255> = Context;
/// } HkdfLabel;
/// ```
pub fn hkdf_expand_label(
    provider: &dyn CryptoProvider,
    secret: &[u8],
    label: &[u8],
    context: &[u8],
    length: usize,
) -> Result<Vec<u8>> {
    const PREFIX: &[u8] = b"tls13 ";

    let label_len = PREFIX.len() + label.len();
    let out_len = u16::try_from(length)
        .map_err(|_| Error::InternalError(format!("HKDF label length {} too large", length)))?;
    if label_len > 255 || context.len() > 255 {
        return Err(Error::InternalError("HKDF label or context too long".into()));
    }

    let mut info = Vec::with_capacity(2 + 1 + label_len + 1 + context.len());
    info.extend_from_slice(&out_len.to_be_bytes());
    info.push(label_len as u8);
    info.extend_from_slice(PREFIX);
    info.extend_from_slice(label);
    info.push(context.len() as u8);
    info.extend_from_slice(context);

    hkdf_expand(provider, secret, &info, length)
}

/// SHA-384 over the concatenated handshake messages.
pub fn transcript_hash(provider: &dyn CryptoProvider, messages: &[u8]) -> Result<Vec<u8>> {
    let mut hasher = provider.hash(SUITE.hash_algorithm())?;
    hasher.update(messages);
    Ok(hasher.finalize())
}

/// Derive-Secret(Secret, Label, Messages) =
///     HKDF-Expand-Label(Secret, Label, Transcript-Hash(Messages), Hash.length)
pub fn derive_secret(
    provider: &dyn CryptoProvider,
    secret: &[u8],
    label: &[u8],
    messages: &[u8],
) -> Result<Vec<u8>> {
    let context = transcript_hash(provider, messages)?;
    hkdf_expand_label(provider, secret, label, &context, HASH_LEN)
}

/// AES-256-GCM seal; returns ciphertext with the 16-byte tag appended.
pub fn aead_encrypt(
    provider: &dyn CryptoProvider,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let aead = provider.aead(SUITE.aead_algorithm())?;
    Ok(aead.seal(key, nonce, aad, plaintext)?)
}

/// AES-256-GCM open of `ciphertext || tag`.
///
/// Fails with [`Error::AuthenticationFailed`] on a bad tag; no plaintext is
/// produced in that case.
pub fn aead_decrypt(
    provider: &dyn CryptoProvider,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let aead = provider.aead(SUITE.aead_algorithm())?;
    Ok(aead.open(key, nonce, aad, ciphertext)?)
}

/// Per-record nonce (RFC 8446 Section 5.3): the 64-bit sequence number,
/// left-padded to the IV length, XORed with the static IV.
pub fn build_nonce(iv: &[u8], sequence_number: u64) -> Result<Vec<u8>> {
    if iv.len() < 8 {
        return Err(Error::InternalError(format!("IV of {} bytes", iv.len())));
    }
    let mut nonce = iv.to_vec();
    let offset = nonce.len() - 8;
    for (n, s) in nonce[offset..].iter_mut().zip(sequence_number.to_be_bytes()) {
        *n ^= s;
    }
    Ok(nonce)
}

/// Write key and IV for one direction of one epoch.
pub struct TrafficKeys {
    /// AEAD key (32 bytes)
    pub key: Zeroizing<Vec<u8>>,

    /// Static IV (12 bytes)
    pub iv: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for TrafficKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficKeys").finish_non_exhaustive()
    }
}

impl TrafficKeys {
    /// key = HKDF-Expand-Label(secret, "key", "", 32);
    /// iv = HKDF-Expand-Label(secret, "iv", "", 12)
    pub fn derive(provider: &dyn CryptoProvider, traffic_secret: &[u8]) -> Result<Self> {
        let key = hkdf_expand_label(provider, traffic_secret, b"key", &[], SUITE.key_length())?;
        let iv = hkdf_expand_label(provider, traffic_secret, b"iv", &[], SUITE.iv_length())?;
        Ok(Self {
            key: Zeroizing::new(key),
            iv: Zeroizing::new(iv),
        })
    }
}

/// Secrets of one handshake, each computed once.
///
/// Created on ClientHello; the session replaces it wholesale rather than
/// mutating a secret that has already been derived.
pub struct KeySchedule {
    early_secret: Zeroizing<Vec<u8>>,
    handshake_secret: Option<Zeroizing<Vec<u8>>>,
    client_handshake_traffic_secret: Option<Zeroizing<Vec<u8>>>,
    server_handshake_traffic_secret: Option<Zeroizing<Vec<u8>>>,
}

impl std::fmt::Debug for KeySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySchedule")
            .field("handshake_secret", &self.handshake_secret.is_some())
            .field(
                "handshake_traffic_secrets",
                &self.server_handshake_traffic_secret.is_some(),
            )
            .finish()
    }
}

impl KeySchedule {
    /// Early Secret = HKDF-Extract(0, 0); no PSK is ever used.
    pub fn new(provider: &dyn CryptoProvider) -> Result<Self> {
        let zeros = [0u8; HASH_LEN];
        let early_secret = hkdf_extract(provider, &zeros, &zeros)?;
        Ok(Self {
            early_secret: Zeroizing::new(early_secret),
            handshake_secret: None,
            client_handshake_traffic_secret: None,
            server_handshake_traffic_secret: None,
        })
    }

    /// Handshake Secret = HKDF-Extract(Derive-Secret(early, "derived", ""), shared).
    pub fn derive_handshake_secret(
        &mut self,
        provider: &dyn CryptoProvider,
        shared_secret: &[u8],
    ) -> Result<()> {
        if self.handshake_secret.is_some() {
            return Err(Error::InternalError("Handshake secret already derived".into()));
        }
        let derived = Zeroizing::new(derive_secret(provider, &self.early_secret, b"derived", &[])?);
        let secret = hkdf_extract(provider, &derived, shared_secret)?;
        self.handshake_secret = Some(Zeroizing::new(secret));
        Ok(())
    }

    /// Derive both handshake traffic secrets over ClientHello..ServerHello.
    pub fn derive_handshake_traffic_secrets(
        &mut self,
        provider: &dyn CryptoProvider,
        transcript: &[u8],
    ) -> Result<()> {
        let handshake_secret = self.handshake_secret()?;
        let client = derive_secret(provider, handshake_secret, b"c hs traffic", transcript)?;
        let server = derive_secret(provider, handshake_secret, b"s hs traffic", transcript)?;
        self.client_handshake_traffic_secret = Some(Zeroizing::new(client));
        self.server_handshake_traffic_secret = Some(Zeroizing::new(server));
        Ok(())
    }

    /// The early secret.
    pub fn early_secret(&self) -> &[u8] {
        &self.early_secret
    }

    /// The handshake secret, once derived.
    pub fn handshake_secret(&self) -> Result<&[u8]> {
        self.handshake_secret
            .as_deref()
            .map(Vec::as_slice)
            .ok_or_else(|| Error::InternalError("Handshake secret not derived".into()))
    }

    /// client_handshake_traffic_secret, once derived.
    pub fn client_handshake_traffic_secret(&self) -> Result<&[u8]> {
        self.client_handshake_traffic_secret
            .as_deref()
            .map(Vec::as_slice)
            .ok_or_else(|| Error::InternalError("Client handshake secret not derived".into()))
    }

    /// server_handshake_traffic_secret, once derived.
    pub fn server_handshake_traffic_secret(&self) -> Result<&[u8]> {
        self.server_handshake_traffic_secret
            .as_deref()
            .map(Vec::as_slice)
            .ok_or_else(|| Error::InternalError("Server handshake secret not derived".into()))
    }
}

/// Master Secret = HKDF-Extract(Derive-Secret(handshake, "derived", ""), 0).
pub fn derive_master_secret(
    provider: &dyn CryptoProvider,
    handshake_secret: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let derived = Zeroizing::new(derive_secret(provider, handshake_secret, b"derived", &[])?);
    Ok(Zeroizing::new(hkdf_extract(provider, &derived, &[0u8; HASH_LEN])?))
}
