//! Error types for tlsterm core.

use core::fmt;

/// Result type for tlsterm core operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that terminate a TLS session.
///
/// A buffer that does not yet hold a whole record is not an error; see
/// [`RecordParse::Incomplete`](crate::record::RecordParse::Incomplete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed or truncated wire structure
    DecodeError(String),

    /// Record larger than the protocol allows
    RecordOverflow(usize),

    /// ClientHello carried no X25519 key share
    MissingKeyShare,

    /// A required extension is absent or does not offer anything usable
    UnsupportedExtension(String),

    /// AEAD tag verification failed
    AuthenticationFailed,

    /// Message arrived in a state that does not expect it
    ProtocolSequence(String),

    /// Negotiation or peer authentication failed
    HandshakeFailure(String),

    /// Alert received from peer
    AlertReceived(AlertDescription),

    /// Invalid configuration
    InvalidConfig(String),

    /// Cryptographic error
    CryptoError(String),

    /// Internal error
    InternalError(String),
}

impl Error {
    /// Alert to send to the peer before closing, if any.
    ///
    /// Returns `None` when the peer already tore the session down.
    pub const fn alert(&self) -> Option<AlertDescription> {
        let description = match self {
            Error::DecodeError(_) => AlertDescription::DecodeError,
            Error::RecordOverflow(_) => AlertDescription::RecordOverflow,
            Error::MissingKeyShare => AlertDescription::MissingExtension,
            Error::UnsupportedExtension(_) => AlertDescription::ProtocolVersion,
            Error::AuthenticationFailed => AlertDescription::BadRecordMac,
            Error::ProtocolSequence(_) => AlertDescription::UnexpectedMessage,
            Error::HandshakeFailure(_) => AlertDescription::HandshakeFailure,
            Error::AlertReceived(_) => return None,
            Error::InvalidConfig(_) | Error::CryptoError(_) | Error::InternalError(_) => {
                AlertDescription::InternalError
            },
        };
        Some(description)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            Error::RecordOverflow(len) => write!(f, "Record overflow: {} bytes", len),
            Error::MissingKeyShare => write!(f, "Missing X25519 key share"),
            Error::UnsupportedExtension(msg) => write!(f, "Unsupported extension: {}", msg),
            Error::AuthenticationFailed => write!(f, "Record authentication failed"),
            Error::ProtocolSequence(msg) => write!(f, "Unexpected message: {}", msg),
            Error::HandshakeFailure(msg) => write!(f, "Handshake failure: {}", msg),
            Error::AlertReceived(desc) => write!(f, "Alert received: {:?}", desc),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            Error::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<tlsterm_crypto::Error> for Error {
    fn from(e: tlsterm_crypto::Error) -> Self {
        match e {
            tlsterm_crypto::Error::AuthenticationFailed => Error::AuthenticationFailed,
            other => Error::CryptoError(other.to_string()),
        }
    }
}

/// TLS alert level (RFC 8446 Section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertLevel {
    /// Warning
    Warning = 1,

    /// Fatal
    Fatal = 2,
}

impl AlertLevel {
    /// Convert from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AlertLevel::Warning),
            2 => Some(AlertLevel::Fatal),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// TLS alert descriptions (RFC 8446 Section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertDescription {
    /// Close notify
    CloseNotify = 0,

    /// Unexpected message
    UnexpectedMessage = 10,

    /// Bad record MAC
    BadRecordMac = 20,

    /// Record overflow
    RecordOverflow = 22,

    /// Handshake failure
    HandshakeFailure = 40,

    /// Bad certificate
    BadCertificate = 42,

    /// Unsupported certificate
    UnsupportedCertificate = 43,

    /// Certificate revoked
    CertificateRevoked = 44,

    /// Certificate expired
    CertificateExpired = 45,

    /// Certificate unknown
    CertificateUnknown = 46,

    /// Illegal parameter
    IllegalParameter = 47,

    /// Unknown CA
    UnknownCa = 48,

    /// Access denied
    AccessDenied = 49,

    /// Decode error
    DecodeError = 50,

    /// Decrypt error
    DecryptError = 51,

    /// Protocol version
    ProtocolVersion = 70,

    /// Insufficient security
    InsufficientSecurity = 71,

    /// Internal error
    InternalError = 80,

    /// Inappropriate fallback
    InappropriateFallback = 86,

    /// User canceled
    UserCanceled = 90,

    /// Missing extension
    MissingExtension = 109,

    /// Unsupported extension
    UnsupportedExtension = 110,

    /// Unrecognized name
    UnrecognizedName = 112,

    /// Bad certificate status response
    BadCertificateStatusResponse = 113,

    /// Unknown PSK identity
    UnknownPskIdentity = 115,

    /// Certificate required
    CertificateRequired = 116,

    /// No application protocol
    NoApplicationProtocol = 120,
}

impl AlertDescription {
    /// Convert from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AlertDescription::CloseNotify),
            10 => Some(AlertDescription::UnexpectedMessage),
            20 => Some(AlertDescription::BadRecordMac),
            22 => Some(AlertDescription::RecordOverflow),
            40 => Some(AlertDescription::HandshakeFailure),
            42 => Some(AlertDescription::BadCertificate),
            43 => Some(AlertDescription::UnsupportedCertificate),
            44 => Some(AlertDescription::CertificateRevoked),
            45 => Some(AlertDescription::CertificateExpired),
            46 => Some(AlertDescription::CertificateUnknown),
            47 => Some(AlertDescription::IllegalParameter),
            48 => Some(AlertDescription::UnknownCa),
            49 => Some(AlertDescription::AccessDenied),
            50 => Some(AlertDescription::DecodeError),
            51 => Some(AlertDescription::DecryptError),
            70 => Some(AlertDescription::ProtocolVersion),
            71 => Some(AlertDescription::InsufficientSecurity),
            80 => Some(AlertDescription::InternalError),
            86 => Some(AlertDescription::InappropriateFallback),
            90 => Some(AlertDescription::UserCanceled),
            109 => Some(AlertDescription::MissingExtension),
            110 => Some(AlertDescription::UnsupportedExtension),
            112 => Some(AlertDescription::UnrecognizedName),
            113 => Some(AlertDescription::BadCertificateStatusResponse),
            115 => Some(AlertDescription::UnknownPskIdentity),
            116 => Some(AlertDescription::CertificateRequired),
            120 => Some(AlertDescription::NoApplicationProtocol),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// A decoded alert record body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    /// Alert level
    pub level: AlertLevel,

    /// Alert description
    pub description: AlertDescription,
}

impl Alert {
    /// Fatal alert with the given description.
    pub const fn fatal(description: AlertDescription) -> Self {
        Self {
            level: AlertLevel::Fatal,
            description,
        }
    }

    /// Warning-level close_notify.
    pub const fn close_notify() -> Self {
        Self {
            level: AlertLevel::Warning,
            description: AlertDescription::CloseNotify,
        }
    }

    /// Encode the two-byte alert body.
    pub fn encode(&self) -> [u8; 2] {
        [self.level.to_u8(), self.description.to_u8()]
    }

    /// Decode a two-byte alert body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != 2 {
            return Err(Error::DecodeError(format!(
                "Alert must be 2 bytes, got {}",
                data.len()
            )));
        }
        let level = AlertLevel::from_u8(data[0])
            .ok_or_else(|| Error::DecodeError(format!("Unknown alert level {}", data[0])))?;
        let description = AlertDescription::from_u8(data[1]).ok_or_else(|| {
            Error::DecodeError(format!("Unknown alert description {}", data[1]))
        })?;
        Ok(Self { level, description })
    }
}
