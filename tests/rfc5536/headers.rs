//! RFC 5536 Section 3 - Header fields
//!
//! Field order is preserved, folded values are unfolded, and repeated fields
//! stay separate.

use mail2news::message::{Headers, parse_message};

#[test]
fn test_field_order_preserved() {
    let message = parse_message("Subject: s\nFrom: f@example.com\nX-Extra: 1\n\nbody\n");
    let names: Vec<_> = message.headers.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Subject", "From", "X-Extra"]);
}

#[test]
fn test_folded_field_unfolds() {
    let message = parse_message("Subject: a long\r\n subject line\r\n\r\nbody\r\n");
    assert_eq!(message.headers.get("Subject"), Some("a long subject line"));
}

#[test]
fn test_unfolding_keeps_folding_whitespace() {
    let message = parse_message("Subject: tabbed\n\tvalue\n\nbody\n");
    assert_eq!(message.headers.get("Subject"), Some("tabbed\tvalue"));
}

#[test]
fn test_no_wire_line_exceeds_limit() {
    let references: Vec<String> = (0..40)
        .map(|n| format!("<{}.thread@news.example.org>", n))
        .collect();
    let raw = format!(
        "Subject: s\nReferences: {}\n\nbody\n",
        references.join("\n ")
    );

    let wire = parse_message(&raw).to_wire();
    assert!(wire.split("\r\n").all(|line| line.len() <= 998));
    assert_eq!(
        parse_message(&wire).headers.get("References"),
        Some(references.join(" ").as_str())
    );
}

#[test]
fn test_field_names_case_insensitive() {
    let message = parse_message("message-id: <a@example.com>\n\nbody\n");
    assert_eq!(message.message_id(), Some("<a@example.com>"));
    assert!(message.headers.contains("MESSAGE-ID"));
}

#[test]
fn test_repeated_fields() {
    let mut headers = Headers::new();
    headers.append("Comments", "one");
    headers.append("Comments", "two");
    assert_eq!(headers.get_all("comments").count(), 2);

    headers.set("Comments", "only");
    assert_eq!(headers.get_all("Comments").collect::<Vec<_>>(), vec!["only"]);
}

#[test]
fn test_mbox_envelope_ignored() {
    let message = parse_message("From someone Thu Jun  1 12:00:00 2023\nSubject: s\n\nbody\n");
    assert_eq!(message.headers.len(), 1);
}
