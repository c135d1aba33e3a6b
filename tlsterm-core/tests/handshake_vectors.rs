//! End-to-end handshake against independently computed vectors.
//!
//! Inputs: a fixed ClientHello (client X25519 private key 0x80..0x9f, session
//! id 0xe0..0xff, an empty GREASE extension), the RSA-2048 fixture in
//! `tests/data/`, timestamp 1600000000, and scripted randomness: server
//! X25519 private key 0x40..0x5f, random tail 0x01..0x1c, PSS salt 0xc0..0xdf.
//! The client Finished and application records were sealed with the
//! corresponding client keys.

mod common;

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tlsterm_core::messages::HandshakeMessage;
use tlsterm_core::record::{split_records, RecordParse, TlsRecord};
use tlsterm_core::{ContentType, ServerHandshake, ServerSession, ServerState};
use tlsterm_crypto::CryptoProvider;
use tlsterm_crypto_rustcrypto::RustCryptoProvider;

const CLIENT_HELLO_RECORD: &str = "160301009e0100009a03031111111111111111111111111111111111111111\
    11111111111111111111111120e0e1e2e3e4e5e6e7e8e9eaebecedeeeff0f1f2f3f4f5f6f7f8f9fafbfcfdfeff\
    00061301130213030100004b000a00060004001d0017000d0006000408040403002b000504030403030033002600\
    24001d0020493e82fc74464a59268817623d2053c5eb8e2cc4a988b4fee179ec6b010d531dfafa0000";

const SERVER_HELLO: &str = "0200007603035f5e10000102030405060708090a0b0c0d0e0f10111213141516\
    1718191a1b1c20e0e1e2e3e4e5e6e7e8e9eaebecedeeeff0f1f2f3f4f5f6f7f8f9fafbfcfdfeff130200002e00\
    2b0002030400330024001d002079a631eede1bf9c98f12032cdeadd0e7a079398fc786b88cc846ec89af85a51a";

const SERVER_FINISHED_VERIFY_DATA: &str = "ac0ba26bfdf12fb37fb153a6f61d0470ceb965dcaf0269909f93\
    b4b674cb363091bec39e020b0cbe3f548da18963bcde";

const SERVER_FLIGHT_SHA256: &str =
    "04d4383eea853aee3432e8a696fc3ce0bed9f39802a4cd806be6889fc0a6935a";

const SERVER_FLIGHT_LEN: usize = 1331;

const HANDSHAKE_SECRET: &str = "eef3a510742729c00aef53467199fbebd1b5240496ae53a47524219f2100ac\
    0ba5545a438ff33e145a53132cd9c125de";

const TRANSCRIPT_HASH: &str = "28e3f554e52787c36688ba279a1dc4bcf6df7c7709d7fb899924e7e6f39ea2\
    6c502bcce7ebf9e25c1b5af51331632368";

const CLIENT_FINISHED_RECORD: &str = "1703030045eddce0b50f54071bdcdba7441faaaab4a9d6402ccb0c8cb8\
    4fa070b3bae9d4a1afd79d5bf1000dc6487a4e0e3bf90e65983ef78b7ebacbc16580c5725a137006e4aff87d38";

const CLIENT_APP_RECORD: &str = "17030300156eb1cee561a958620902c98e887d0ce6ca18a9a4a4";

const SERVER_APP_RECORD: &str = "17030300150ba568c21d9070680b9ed5b267d06c4618d669c3b1";

const CERT_DER_SHA256: &str = "6ed7be42874fb5697b2065df4957dd4fbf357d66f3d946ddc4e344eccff34990";

fn compact(s: &str) -> String {
    s.split_whitespace().collect()
}

fn unhex(s: &str) -> Vec<u8> {
    hex::decode(compact(s)).unwrap()
}

fn scripted_provider() -> RustCryptoProvider {
    RustCryptoProvider::with_random(common::scripted_server_random())
}

#[test]
fn test_certificate_fixture() {
    let config = common::config();
    assert_eq!(config.certificate_chain().len(), 1);
    assert_eq!(
        hex::encode(Sha256::digest(&config.certificate_chain()[0])),
        CERT_DER_SHA256
    );
}

#[test]
fn test_handshake_artifacts_match_vectors() {
    let random = common::scripted_server_random();
    let provider = RustCryptoProvider::with_random(random.clone());
    let record = unhex(CLIENT_HELLO_RECORD);
    let (records, rest) = split_records(&record).unwrap();
    assert!(rest.is_empty());
    let raw = records[0].fragment.clone();
    let HandshakeMessage::ClientHello(hello) = HandshakeMessage::decode(&raw).unwrap() else {
        panic!("not a ClientHello");
    };

    let mut server = ServerHandshake::new();
    let flight = server
        .process_client_hello(&provider, &common::config(), &hello, &raw)
        .unwrap();
    assert_eq!(flight.records[0].fragment, unhex(SERVER_HELLO));
    assert_eq!(random.remaining(), 0);

    let artifacts = server.complete_handshake(&provider).unwrap();
    assert_eq!(hex::encode(artifacts.handshake_secret()), compact(HANDSHAKE_SECRET));
    assert_eq!(hex::encode(artifacts.transcript_hash()), compact(TRANSCRIPT_HASH));

    // The transcript ends with the server Finished message.
    let transcript = artifacts.transcript();
    let finished = &transcript[transcript.len() - 52..];
    assert_eq!(&finished[..4], &[20, 0, 0, 48]);
    assert_eq!(&finished[4..], unhex(SERVER_FINISHED_VERIFY_DATA).as_slice());
    assert_eq!(server.state(), ServerState::AwaitingClientFinished);
}

#[test]
fn test_server_flight_bytes() {
    let provider = scripted_provider();
    let mut session = ServerSession::new(common::config());

    let output = session
        .read_bytes(&provider, &unhex(CLIENT_HELLO_RECORD))
        .unwrap();
    assert_eq!(output.outbound.len(), SERVER_FLIGHT_LEN);
    assert_eq!(hex::encode(Sha256::digest(&output.outbound)), SERVER_FLIGHT_SHA256);
    assert!(!output.handshake_complete);

    let (records, rest) = split_records(&output.outbound).unwrap();
    assert!(rest.is_empty());
    assert_eq!(records.len(), 5);
    assert_eq!(
        records[0],
        TlsRecord::new(ContentType::Handshake, unhex(SERVER_HELLO))
    );
    for record in &records[1..] {
        assert_eq!(record.content_type, ContentType::ApplicationData);
    }
}

#[test]
fn test_full_session_with_pinned_client() {
    let provider = scripted_provider();
    let mut session = ServerSession::new(common::config());
    session
        .read_bytes(&provider, &unhex(CLIENT_HELLO_RECORD))
        .unwrap();
    assert!(session.has_application_keys());
    assert!(!session.is_handshake_complete());

    let output = session
        .read_bytes(&provider, &unhex(CLIENT_FINISHED_RECORD))
        .unwrap();
    assert!(output.handshake_complete);
    assert!(output.outbound.is_empty());
    assert_eq!(session.state(), ServerState::AwaitingApplicationTraffic);

    let output = session
        .read_bytes(&provider, &unhex(CLIENT_APP_RECORD))
        .unwrap();
    assert_eq!(output.application_data, vec![b"ping".to_vec()]);

    let sealed = session.send(&provider, b"pong").unwrap();
    assert_eq!(hex::encode(sealed), SERVER_APP_RECORD);
}

#[test]
fn test_client_hello_byte_at_a_time() {
    let provider = scripted_provider();
    let mut session = ServerSession::new(common::config());
    let record = unhex(CLIENT_HELLO_RECORD);

    let mut outbound = Vec::new();
    for byte in &record {
        let output = session.read_bytes(&provider, std::slice::from_ref(byte)).unwrap();
        outbound.extend(output.outbound);
    }
    assert_eq!(hex::encode(Sha256::digest(&outbound)), SERVER_FLIGHT_SHA256);
}

#[test]
fn test_coalesced_client_records() {
    let provider = scripted_provider();
    let mut session = ServerSession::new(common::config());

    let mut all = unhex(CLIENT_HELLO_RECORD);
    all.extend(unhex(CLIENT_FINISHED_RECORD));
    all.extend(unhex(CLIENT_APP_RECORD));

    let output = session.read_bytes(&provider, &all).unwrap();
    assert_eq!(output.outbound.len(), SERVER_FLIGHT_LEN);
    assert!(output.handshake_complete);
    assert_eq!(output.application_data, vec![b"ping".to_vec()]);
}

#[test]
fn test_application_record_before_finished_rejected() {
    let provider = scripted_provider();
    let mut session = ServerSession::new(common::config());
    session
        .read_bytes(&provider, &unhex(CLIENT_HELLO_RECORD))
        .unwrap();

    // Sealed under application keys, so the handshake keys reject it; either
    // way it is never delivered.
    let err = session
        .read_bytes(&provider, &unhex(CLIENT_APP_RECORD))
        .unwrap_err();
    assert_eq!(err, tlsterm_core::Error::AuthenticationFailed);
    assert!(session.is_poisoned());

    // The alert goes out under the server handshake keys.
    let alert = session.fatal_alert(&provider, &err).unwrap();
    match TlsRecord::decode(&alert).unwrap() {
        RecordParse::Complete { record, consumed } => {
            assert_eq!(consumed, alert.len());
            assert_eq!(record.content_type, ContentType::ApplicationData);
            assert_eq!(record.fragment.len(), 2 + 1 + 16);
        },
        RecordParse::Incomplete => panic!("incomplete alert record"),
    }
}

#[test]
fn test_tampered_client_finished_fails() {
    let provider = scripted_provider();
    let mut session = ServerSession::new(common::config());
    session
        .read_bytes(&provider, &unhex(CLIENT_HELLO_RECORD))
        .unwrap();

    let mut finished = unhex(CLIENT_FINISHED_RECORD);
    let last = finished.len() - 1;
    finished[last] ^= 0x01;
    assert_eq!(
        session.read_bytes(&provider, &finished).unwrap_err(),
        tlsterm_core::Error::AuthenticationFailed
    );
}

#[test]
fn test_random_exhaustion_is_an_error() {
    let provider = RustCryptoProvider::with_random(Arc::new(common::ScriptedRandom::new(
        vec![0x40; 40],
    )));
    let mut session = ServerSession::new(common::config());
    let err = session
        .read_bytes(&provider, &unhex(CLIENT_HELLO_RECORD))
        .unwrap_err();
    assert!(matches!(err, tlsterm_core::Error::CryptoError(_)));
    // Nothing has been sent yet, so the alert is plaintext.
    assert_eq!(
        session.fatal_alert(&provider, &err).unwrap(),
        vec![21, 3, 3, 0, 2, 2, 80]
    );
}

#[test]
fn test_provider_is_reached_through_trait_object() {
    let provider: Arc<dyn CryptoProvider> = Arc::new(scripted_provider());
    let mut session = ServerSession::new(common::config());
    let output = session
        .read_bytes(provider.as_ref(), &unhex(CLIENT_HELLO_RECORD))
        .unwrap();
    assert_eq!(hex::encode(Sha256::digest(&output.outbound)), SERVER_FLIGHT_SHA256);
}
