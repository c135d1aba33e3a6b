//! Errors surfaced by the transport driver.

use core::fmt;
use std::io;

/// Result type for transport operations.
pub type Result<T> = core::result::Result<T, Error>;

/// A TLS session error or a failure of the underlying stream.
#[derive(Debug)]
pub enum Error {
    /// The session failed; any alert has already been written
    Tls(tlsterm_core::Error),

    /// Reading from or writing to the transport failed
    Io(io::Error),
}

impl Error {
    /// The TLS error, if this is one.
    pub fn tls(&self) -> Option<&tlsterm_core::Error> {
        match self {
            Error::Tls(e) => Some(e),
            Error::Io(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Tls(e) => write!(f, "TLS error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Tls(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<tlsterm_core::Error> for Error {
    fn from(e: tlsterm_core::Error) -> Self {
        Error::Tls(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
