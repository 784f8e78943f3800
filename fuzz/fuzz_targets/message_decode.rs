//! Random-input fuzzer for inbound message decoding
//!
//! Feeds arbitrary text to `ServerMessage::decode` and drives the session
//! state machine with whatever decodes. Invariants checked:
//! - Decoding never panics, whatever the input
//! - A decoded known message re-encodes and decodes to the same value
//! - `config` never changes the authenticated/claimed flags
//! - Only `auth_success` can set `authenticated`

#![no_main]

use chrono::NaiveDateTime;
use libfuzzer_sys::fuzz_target;
use loam_core::{Credentials, Session};
use loam_proto::ServerMessage;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut session = Session::new(Credentials::new("fuzz-device", "fuzz-key"));
    let now = NaiveDateTime::default();

    // One message per line, like a stream of text frames
    for line in text.lines() {
        let Ok(message) = ServerMessage::decode(line) else {
            continue;
        };

        if !matches!(message, ServerMessage::Unknown { .. }) {
            let encoded = message.encode().expect("decoded message must re-encode");
            let decoded = ServerMessage::decode(&encoded).expect("re-encoded message must decode");
            assert_eq!(decoded, message, "round trip changed the message");
        }

        let before = session.state();
        session.handle_message(&message, now);
        let after = session.state();

        match message {
            ServerMessage::Config(_) => {
                assert_eq!(before.authenticated, after.authenticated);
                assert_eq!(before.claimed, after.claimed);
            },
            ServerMessage::AuthSuccess(_) => assert!(after.authenticated),
            _ => assert_eq!(before.authenticated, after.authenticated),
        }
    }
});
