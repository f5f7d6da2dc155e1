//! Integration tests for mail2news
//!
//! These tests verify the public API works correctly.
//! They do not require a real NNTP server.

use std::io::Write;

use chrono::{TimeZone, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;

use mail2news::{
    GatewayConfig, GatewayError, ModeratedGroups, NntpError, RejectReason, RunOptions, history,
    moderated, process, router,
};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap()
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mail2newsrc");
    std::fs::write(
        &path,
        r#"
[nntp]
path = "gate.example.org"

[thresholds]
max_crossposts = 5

[[peers]]
host = "news.example.net:563"
method = "post"
"#,
    )
    .unwrap();

    let config = GatewayConfig::load(Some(&path)).unwrap();
    assert_eq!(config.nntp.path, "gate.example.org");
    assert_eq!(config.thresholds.max_crossposts, 5);
    assert_eq!(config.thresholds.max_bytes, 200_000); // Should keep other defaults
    assert_eq!(config.peers[0].pattern, None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_incomplete_peer_entry_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mail2newsrc");
    std::fs::write(
        &path,
        r#"
[[peers]]
host = "good.example"
method = "ihave"

[[peers]]
host = "broken.example"
pattern = '^alt\.'
"#,
    )
    .unwrap();

    let config = GatewayConfig::load(Some(&path)).unwrap();
    assert_eq!(config.peers.len(), 2);
    assert_eq!(config.peers[1].method, "");

    let peers = router::select_peers(&config.peers, &["alt.test".to_string()]);
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].host, "good.example");
}

#[test]
fn test_config_missing_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = GatewayConfig::load(Some(&dir.path().join("absent")));
    assert!(matches!(result, Err(GatewayError::Config(_))));
}

#[test]
fn test_config_validation() {
    let mut config = GatewayConfig::default();
    config.hsub.length = 33;
    assert!(matches!(config.validate(), Err(GatewayError::Config(_))));

    let mut config = GatewayConfig::default();
    config.thresholds.max_crossposts = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_error_display() {
    assert_eq!(NntpError::Timeout.to_string(), "Connection timeout");
    assert_eq!(
        NntpError::Protocol {
            code: 502,
            message: "Permission denied".to_string()
        }
        .to_string(),
        "NNTP error 502: Permission denied"
    );
    assert_eq!(
        RejectReason::TooLarge { size: 10, limit: 5 }.to_string(),
        "message of 10 bytes exceeds 5 byte limit"
    );
}

#[test]
fn test_nntp_error_codes() {
    assert_eq!(NntpError::ArticleNotWanted(String::new()).code(), Some(435));
    assert_eq!(NntpError::PostingFailed(String::new()).code(), Some(441));
    assert_eq!(NntpError::ConnectionClosed.code(), None);
}

#[test]
fn test_moderated_store_blocks_posting() {
    let dir = tempfile::tempdir().unwrap();
    let active = dir.path().join("active.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(b"alt.test 0000000010 0000000001 y\ncomp.lang.moderated 0000000010 0000000001 m\n")
        .unwrap();
    std::fs::write(&active, encoder.finish().unwrap()).unwrap();

    let lib = dir.path().join("lib");
    let store = moderated::import(&active, &lib).unwrap();
    assert_eq!(store.len(), 1);

    let reloaded = ModeratedGroups::load(&ModeratedGroups::store_path(&lib)).unwrap();
    assert!(reloaded.contains("comp.lang.moderated"));

    let options = RunOptions {
        newsgroups: Some("alt.test,comp.lang.moderated".to_string()),
        ..RunOptions::default()
    };
    let raw = "From: a@example.com\nSubject: hi\n\nbody\n";
    let result = process(raw, &options, &GatewayConfig::default(), now(), Some(&reloaded));
    assert_eq!(
        result.unwrap_err(),
        RejectReason::ModeratedGroup("comp.lang.moderated".to_string())
    );
}

#[test]
fn test_history_appends_to_daily_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = history::record(dir.path(), b"From: a@b\n\none\n", now()).unwrap();
    let second = history::record(dir.path(), b"From: c@d\n\ntwo\n", now()).unwrap();

    assert_eq!(first, second);
    assert!(first.ends_with("2023-06-01"));
    let text = std::fs::read_to_string(first).unwrap();
    assert!(text.contains("one"));
    assert!(text.contains("two"));
}

#[test]
fn test_rejected_message_has_no_peers_contacted() {
    let options = RunOptions {
        newsgroups: Some("not a group".to_string()),
        ..RunOptions::default()
    };
    let raw = "From: a@example.com\n\nbody\n";
    assert_eq!(
        process(raw, &options, &GatewayConfig::default(), now(), None).unwrap_err(),
        RejectReason::NoValidNewsgroups
    );
}

#[test]
fn test_quoted_printable_delimiter_removed() {
    let options = RunOptions {
        newsgroups: Some("alt.test".to_string()),
        ..RunOptions::default()
    };
    let raw = "From: a@example.com\n\
               Content-Transfer-Encoding: quoted-printable\n\
               \n\
               -----BEGIN TYPE III ANONYMOUS MESSAGE-----\n\
               Message-type: plaintext\n\
               \n\
               the message\n\
               -----END TYPE III ANONYM=\n\
               OUS MESSAGE-----\n";

    let prepared = process(raw, &options, &GatewayConfig::default(), now(), None).unwrap();
    assert!(!prepared.payload.contains("TYPE III"));
    assert!(!prepared.payload.contains("ANONYM"));
    assert!(prepared.payload.contains("the message"));
}
