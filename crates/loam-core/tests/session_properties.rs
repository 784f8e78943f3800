//! Property-based tests for classification, signatures and the session
//! state machine.
//!
//! These tests use proptest to verify invariants hold for all inputs:
//! - Classification is total and boundaries belong to the lower band
//! - Signatures are deterministic and input-sensitive
//! - Threshold reconfiguration never touches auth/claim flags
//! - Only a reset clears authentication

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use loam_core::{
    Credentials, MoistureStatus, Session, SessionAction, Thresholds, auth::signature, classify,
};
use loam_proto::{AuthSuccess, Notice, ServerMessage, ThresholdUpdate};
use proptest::prelude::*;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|d| d.and_hms_opt(12, 0, 0)).expect("valid date")
}

// Strategy for ordered threshold tables (red <= yellow <= green)
fn ordered_thresholds() -> impl Strategy<Value = Thresholds> {
    (0i64..=100, 0i64..=100, 0i64..=100).prop_map(|(a, b, c)| {
        let mut bounds = [a, b, c];
        bounds.sort_unstable();
        Thresholds::new(bounds[0], bounds[1], bounds[2])
    })
}

fn update_strategy() -> impl Strategy<Value = ThresholdUpdate> {
    (
        proptest::option::of(-50i64..=150),
        proptest::option::of(-50i64..=150),
        proptest::option::of(-50i64..=150),
    )
        .prop_map(|(red, yellow, green)| ThresholdUpdate { red, yellow, green })
}

// Strategy for arbitrary inbound messages
fn message_strategy() -> impl Strategy<Value = ServerMessage> {
    prop_oneof![
        Just(ServerMessage::Welcome(Notice::default())),
        any::<bool>().prop_map(|claimed| ServerMessage::AuthSuccess(AuthSuccess {
            claimed,
            thresholds: ThresholdUpdate::default(),
        })),
        update_strategy().prop_map(ServerMessage::Claimed),
        update_strategy().prop_map(ServerMessage::Config),
        Just(ServerMessage::Ack),
        Just(ServerMessage::Error(Notice { message: Some("nope".to_string()) })),
        Just(ServerMessage::Unknown { kind: Some("reboot".to_string()), raw: serde_json::json!({}) }),
    ]
}

fn rank(status: MoistureStatus) -> u8 {
    match status {
        MoistureStatus::Dry => 0,
        MoistureStatus::Low => 1,
        MoistureStatus::Good => 2,
        MoistureStatus::Wet => 3,
    }
}

#[test]
fn prop_classification_matches_band_definition() {
    proptest!(|(level in 0u8..=100, table in ordered_thresholds())| {
        let status = classify(level, &table);
        let level = i64::from(level);

        let expected = if level <= table.red {
            MoistureStatus::Dry
        } else if level <= table.yellow {
            MoistureStatus::Low
        } else if level <= table.green {
            MoistureStatus::Good
        } else {
            MoistureStatus::Wet
        };
        prop_assert_eq!(status, expected);
    });
}

#[test]
fn prop_boundary_equality_belongs_to_lower_band() {
    proptest!(|(table in ordered_thresholds())| {
        for bound in [table.red, table.yellow, table.green] {
            let level = u8::try_from(bound).expect("bounds are within 0..=100");
            let at = classify(level, &table);

            prop_assert!(at != MoistureStatus::Wet);
            if level < 100 {
                prop_assert!(rank(at) <= rank(classify(level + 1, &table)));
            }
        }
    });
}

#[test]
fn prop_classification_is_monotonic_for_ordered_tables() {
    proptest!(|(a in 0u8..=100, b in 0u8..=100, table in ordered_thresholds())| {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rank(classify(low, &table)) <= rank(classify(high, &table)));
    });
}

#[test]
fn prop_signature_is_deterministic() {
    proptest!(|(device in "[a-z0-9-]{1,16}", key in "[a-f0-9]{1,32}", ts in "[0-9T:.-]{1,26}")| {
        let first = signature(&device, &key, &ts);
        let second = signature(&device, &key, &ts);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), 32);
        prop_assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    });
}

#[test]
fn prop_signature_changes_with_any_input() {
    proptest!(|(device in "[a-z0-9]{1,16}", key in "[a-f0-9]{1,32}", ts in "[0-9]{1,20}")| {
        let base = signature(&device, &key, &ts);

        prop_assert_ne!(&base, &signature(&format!("{device}x"), &key, &ts));
        prop_assert_ne!(&base, &signature(&device, &format!("{key}0"), &ts));
        prop_assert_ne!(&base, &signature(&device, &key, &format!("{ts}1")));
    });
}

#[test]
fn signatures_do_not_collide_across_a_corpus() {
    let mut seen = HashSet::new();

    for device in 0..20 {
        for key in 0..10 {
            for second in 0..10 {
                let ts = format!("2024-05-01T12:00:{second:02}.000000");
                let sig = signature(&format!("dev-{device}"), &format!("key-{key}"), &ts);
                assert!(seen.insert(sig), "collision for dev-{device} key-{key} {ts}");
            }
        }
    }

    assert_eq!(seen.len(), 2000);
}

#[test]
fn prop_config_never_changes_flags() {
    proptest!(|(history in proptest::collection::vec(message_strategy(), 0..20), update in update_strategy())| {
        let mut session = Session::new(Credentials::new("dev-1", "secret"));
        for message in &history {
            session.handle_message(message, now());
        }
        let before = session.state();

        let actions = session.handle_message(&ServerMessage::Config(update), now());

        prop_assert!(actions.is_empty());
        prop_assert_eq!(session.state().authenticated, before.authenticated);
        prop_assert_eq!(session.state().claimed, before.claimed);
        prop_assert_eq!(session.state().thresholds, Thresholds::from(&update));
    });
}

#[test]
fn prop_only_reset_clears_authentication() {
    proptest!(|(history in proptest::collection::vec(message_strategy(), 0..30))| {
        let mut session = Session::new(Credentials::new("dev-1", "secret"));
        let mut authenticated = false;

        for message in &history {
            session.handle_message(message, now());

            if matches!(message, ServerMessage::AuthSuccess(_)) {
                authenticated = true;
            }
            prop_assert_eq!(session.state().authenticated, authenticated);
        }

        session.reset();
        prop_assert!(!session.state().authenticated);
        prop_assert!(!session.state().claimed);
    });
}

#[test]
fn prop_start_reporting_only_from_claim_paths() {
    proptest!(|(message in message_strategy())| {
        let mut session = Session::new(Credentials::new("dev-1", "secret"));
        let actions = session.handle_message(&message, now());
        let starts = actions.iter().filter(|a| **a == SessionAction::StartReporting).count();

        let expected = match &message {
            ServerMessage::AuthSuccess(success) => usize::from(success.claimed),
            ServerMessage::Claimed(_) => 1,
            _ => 0,
        };
        prop_assert_eq!(starts, expected);
    });
}
