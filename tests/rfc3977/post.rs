//! RFC 3977 Section 6.3.1 - POST
//!
//! POST is answered with 340 when posting is allowed; the article follows
//! and the server replies 240 or 441.
//!
//! Reference: https://datatracker.ietf.org/doc/html/rfc3977#section-6.3.1

use mail2news::message::{Headers, Message};
use mail2news::{DeliveryOutcome, NntpError, NntpResponse, ResponseClass, codes, commands};

#[test]
fn test_post_command_format() {
    assert_eq!(commands::post(), "POST\r\n");
}

#[test]
fn test_end_of_article_line() {
    assert_eq!(commands::end_of_article(), ".\r\n");
}

#[test]
fn test_post_reply_codes() {
    let go_ahead = NntpResponse {
        code: codes::SEND_ARTICLE,
        message: "Input article; end with <CR-LF>.<CR-LF>".to_string(),
    };
    assert_eq!(go_ahead.class(), ResponseClass::Continuation);
    assert_eq!(ResponseClass::of(codes::ARTICLE_POSTED), ResponseClass::Success);
    assert_eq!(ResponseClass::of(codes::POSTING_NOT_PERMITTED), ResponseClass::Temporary);
    assert_eq!(ResponseClass::of(codes::POSTING_FAILED), ResponseClass::Temporary);
}

#[test]
fn test_article_wire_format_is_dot_stuffed() {
    let mut headers = Headers::new();
    headers.append("Newsgroups", "alt.test");
    headers.append("Subject", "dots");
    let message = Message::new(headers, "line one\n.\n..two\n");

    let wire = message.to_wire();
    assert_eq!(
        wire,
        "Newsgroups: alt.test\r\nSubject: dots\r\n\r\nline one\r\n..\r\n...two\r\n"
    );
    // The terminating line is sent separately and never appears on its own
    assert!(!wire.contains("\r\n.\r\n"));
}

#[test]
fn test_post_refusals() {
    assert!(matches!(
        DeliveryOutcome::from_result(Err(NntpError::PostingFailed("bad".into()))),
        DeliveryOutcome::TemporaryReject(_)
    ));
    assert!(matches!(
        DeliveryOutcome::from_result(Err(NntpError::Protocol {
            code: codes::ACCESS_DENIED,
            message: "no".into()
        })),
        DeliveryOutcome::PermanentReject(_)
    ));
}
