//! RFC 3977 Section 5.3 - MODE READER
//!
//! Reference: https://datatracker.ietf.org/doc/html/rfc3977#section-5.3
//!
//! Sent ahead of POST. Transit servers may not know it and answer 5xx.

use mail2news::{NntpResponse, codes, commands};

#[test]
fn test_mode_reader_command_format() {
    let cmd = commands::mode_reader();
    assert_eq!(cmd, "MODE READER\r\n");
    assert_eq!(cmd.matches("\r\n").count(), 1);
}

#[test]
fn test_mode_reader_replies() {
    for code in [codes::READY_POSTING_ALLOWED, codes::READY_NO_POSTING] {
        let response = NntpResponse {
            code,
            message: "reader mode".to_string(),
        };
        assert!(response.is_success());
    }

    let unknown = NntpResponse {
        code: codes::COMMAND_NOT_RECOGNIZED,
        message: "What?".to_string(),
    };
    assert!(unknown.is_error());
}

#[test]
fn test_quit_command_format() {
    assert_eq!(commands::quit(), "QUIT\r\n");
}
