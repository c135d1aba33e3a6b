//! TLS handshake protocol implementation.
//!
//! Only the server side of TLS 1.3 is implemented.

pub mod server;

pub use server::{ServerFlight, ServerHandshake, ServerState};

use zeroize::Zeroizing;

/// What a finished server flight leaves behind for the application channel.
///
/// Returned by value from [`ServerHandshake::complete_handshake`].
#[derive(Clone)]
pub struct HandshakeArtifacts {
    handshake_secret: Zeroizing<Vec<u8>>,
    transcript: Vec<u8>,
    transcript_hash: Vec<u8>,
}

impl std::fmt::Debug for HandshakeArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeArtifacts")
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

impl HandshakeArtifacts {
    /// Bundle a handshake secret with the transcript it was used over.
    pub fn new(handshake_secret: Vec<u8>, transcript: Vec<u8>, transcript_hash: Vec<u8>) -> Self {
        Self {
            handshake_secret: Zeroizing::new(handshake_secret),
            transcript,
            transcript_hash,
        }
    }

    /// The handshake secret.
    pub fn handshake_secret(&self) -> &[u8] {
        &self.handshake_secret
    }

    /// ClientHello through server Finished, as sent and received.
    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    /// SHA-384 of [`transcript`](Self::transcript).
    pub fn transcript_hash(&self) -> &[u8] {
        &self.transcript_hash
    }
}
