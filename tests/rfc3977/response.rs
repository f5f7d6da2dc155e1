//! RFC 3977 Section 3.2 - Response Codes
//!
//! Reference: https://datatracker.ietf.org/doc/html/rfc3977#section-3.2

use mail2news::commands::{parse_response_line, parse_single_response};
use mail2news::{NntpError, ResponseClass};

#[test]
fn test_first_digit_classes() {
    assert_eq!(ResponseClass::of(200), ResponseClass::Success);
    assert_eq!(ResponseClass::of(335), ResponseClass::Continuation);
    assert_eq!(ResponseClass::of(400), ResponseClass::Temporary);
    assert_eq!(ResponseClass::of(503), ResponseClass::Permanent);
    assert_eq!(ResponseClass::of(111), ResponseClass::Unknown);
    assert_eq!(ResponseClass::of(0), ResponseClass::Unknown);
}

#[test]
fn test_parse_single_response() {
    let response = parse_single_response("235 Article transferred OK").unwrap();
    assert_eq!(response.code, 235);
    assert_eq!(response.message, "Article transferred OK");
}

#[test]
fn test_garbage_status_line() {
    assert!(matches!(
        parse_response_line("HTTP/1.1 400 Bad Request"),
        Err(NntpError::InvalidResponse(_))
    ));
}
