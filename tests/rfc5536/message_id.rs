//! RFC 5536 Section 3.1.3 - Message-ID
//!
//! msg-id = "<" msg-id-core ">", with exactly one "@" and no whitespace.

use chrono::{TimeZone, Utc};
use mail2news::message::{generate_message_id, normalize};
use mail2news::validation::validate_message_id;

#[test]
fn test_valid_message_ids() {
    assert!(validate_message_id("<abc@example.com>").is_ok());
    assert!(validate_message_id("<20230601120000.x1Y2@gate.example.net>").is_ok());
}

#[test]
fn test_invalid_message_ids() {
    assert!(validate_message_id("").is_err());
    assert!(validate_message_id("<>").is_err());
    assert!(validate_message_id("<@example.com>").is_err());
    assert!(validate_message_id("<a@>").is_err());
    assert!(validate_message_id("<a@b@c>").is_err());
    assert!(validate_message_id("<a b@c>").is_err());
}

#[test]
fn test_generated_ids_are_valid_and_unique() {
    let now = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
    let first = generate_message_id("gate.example.net", now);
    let second = generate_message_id("gate.example.net", now);
    assert!(validate_message_id(&first).is_ok());
    assert_ne!(first, second);
}

#[test]
fn test_missing_id_is_assigned() {
    let now = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
    let message = normalize("Subject: s\n\nbody\n", "gate.example.net", now);
    let mid = message.message_id().unwrap();
    assert!(mid.ends_with("@gate.example.net>"));
}

#[test]
fn test_existing_id_is_kept() {
    let now = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
    let message = normalize("Message-ID: <keep@example.com>\n\nbody\n", "gate.example.net", now);
    assert_eq!(message.message_id(), Some("<keep@example.com>"));
    assert_eq!(message.headers.get_all("Message-ID").count(), 1);
}
