//! RFC 3977 Section 6.3.2 - IHAVE
//!
//! IHAVE offers an article by Message-ID. The peer answers 335 if it wants
//! the article, then 235 once it has been transferred.
//!
//! Reference: https://datatracker.ietf.org/doc/html/rfc3977#section-6.3.2

use mail2news::{DeliveryOutcome, NntpError, NntpResponse, ResponseClass, codes, commands};

fn response(code: u16) -> NntpResponse {
    NntpResponse {
        code,
        message: String::new(),
    }
}

#[test]
fn test_ihave_command_format() {
    assert_eq!(commands::ihave("<test@example.com>"), "IHAVE <test@example.com>\r\n");
}

#[test]
fn test_ihave_command_single_line() {
    let cmd = commands::ihave("<20230601120000.aB3dE5fG7hJ9@gate.example>");
    assert!(cmd.starts_with("IHAVE <"));
    assert_eq!(cmd.matches("\r\n").count(), 1);
}

#[test]
fn test_ihave_first_phase_codes() {
    assert_eq!(response(codes::SEND_ARTICLE_TRANSFER).class(), ResponseClass::Continuation);
    assert!(response(codes::ARTICLE_NOT_WANTED).is_error());
    assert!(response(codes::TRANSFER_NOT_POSSIBLE).is_error());
}

#[test]
fn test_ihave_second_phase_codes() {
    assert!(response(codes::ARTICLE_TRANSFERRED).is_success());
    assert_eq!(response(codes::TRANSFER_REJECTED).class(), ResponseClass::Temporary);
}

#[test]
fn test_ihave_refusals_are_temporary_rejects() {
    for err in [
        NntpError::ArticleNotWanted("have it".into()),
        NntpError::TransferNotPossible("later".into()),
        NntpError::TransferRejected("no".into()),
    ] {
        assert!(matches!(
            DeliveryOutcome::from_result(Err(err)),
            DeliveryOutcome::TemporaryReject(_)
        ));
    }
}
