//! End-to-end gateway tests against local mock NNTP peers
//!
//! Each mock accepts one connection, answers from a small script and hands
//! back the article it received.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use mail2news::router::{DeliveryMethod, Peer};
use mail2news::{DeliveryOutcome, GatewayConfig, PeerConfig, RejectReason, RunOptions, deliver, process};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Replies a mock peer gives to the offer and to the transferred article
#[derive(Clone, Copy)]
struct Script {
    offer: &'static str,
    accept: &'static str,
}

const ACCEPT_IHAVE: Script = Script {
    offer: "335 Send it",
    accept: "235 Article transferred OK",
};

const ACCEPT_POST: Script = Script {
    offer: "340 Input article",
    accept: "240 Article received OK",
};

/// Start a mock peer; the handle yields the dot-terminated article it read
async fn mock_peer(script: Script) -> (u16, JoinHandle<Option<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        write.write_all(b"200 mock ready\r\n").await.unwrap();

        let mut article = None;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let command = line.trim_end().to_ascii_uppercase();

            if command == "QUIT" {
                write.write_all(b"205 bye\r\n").await.unwrap();
                break;
            } else if command == "MODE READER" {
                write.write_all(b"200 reader\r\n").await.unwrap();
            } else if command.starts_with("IHAVE") || command == "POST" {
                write.write_all(format!("{}\r\n", script.offer).as_bytes()).await.unwrap();
                if !script.offer.starts_with('3') {
                    continue;
                }
                let mut text = String::new();
                loop {
                    line.clear();
                    reader.read_line(&mut line).await.unwrap();
                    if line == ".\r\n" {
                        break;
                    }
                    text.push_str(&line);
                }
                article = Some(text);
                write.write_all(format!("{}\r\n", script.accept).as_bytes()).await.unwrap();
            } else {
                write.write_all(b"500 What?\r\n").await.unwrap();
            }
        }
        article
    });

    (port, handle)
}

/// A local port with nothing listening
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn local(port: u16, method: DeliveryMethod) -> Peer {
    Peer::parse(&format!("127.0.0.1:{}", port), None, method).unwrap()
}

#[tokio::test]
async fn test_ihave_delivery() {
    let (port, handle) = mock_peer(ACCEPT_IHAVE).await;
    let payload = "Message-ID: <1@example.net>\r\n\r\nhello\r\n";

    let reports = deliver(
        "<1@example.net>",
        payload,
        &[local(port, DeliveryMethod::Ihave)],
        1000,
        TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, DeliveryOutcome::Delivered);
    assert_eq!(reports[0].peer, format!("127.0.0.1:{}", port));
    assert_eq!(handle.await.unwrap().as_deref(), Some(payload));
}

#[tokio::test]
async fn test_post_delivery() {
    let (port, handle) = mock_peer(ACCEPT_POST).await;
    let payload = "Subject: post\r\n\r\n..dotted\r\n";

    let reports = deliver("<2@example.net>", payload, &[local(port, DeliveryMethod::Post)], 1000, TIMEOUT)
        .await
        .unwrap();

    assert!(reports[0].outcome.is_delivered());
    assert_eq!(reports[0].method, DeliveryMethod::Post);
    assert_eq!(handle.await.unwrap().as_deref(), Some(payload));
}

#[tokio::test]
async fn test_failed_peer_does_not_stop_the_rest() {
    let (first, first_handle) = mock_peer(ACCEPT_IHAVE).await;
    let dead = closed_port().await;
    let (third, third_handle) = mock_peer(ACCEPT_POST).await;

    let peers = [
        local(first, DeliveryMethod::Ihave),
        local(dead, DeliveryMethod::Ihave),
        local(third, DeliveryMethod::Post),
    ];
    let reports = deliver("<3@example.net>", "Subject: x\r\n\r\nbody\r\n", &peers, 1000, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].outcome, DeliveryOutcome::Delivered);
    assert!(matches!(reports[1].outcome, DeliveryOutcome::TransportError(_)));
    assert_eq!(reports[2].outcome, DeliveryOutcome::Delivered);
    assert!(first_handle.await.unwrap().is_some());
    assert!(third_handle.await.unwrap().is_some());
}

#[tokio::test]
async fn test_refusals_are_classified() {
    let (dup, dup_handle) = mock_peer(Script {
        offer: "435 Duplicate",
        accept: "",
    })
    .await;
    let (denied, denied_handle) = mock_peer(Script {
        offer: "502 No permission",
        accept: "",
    })
    .await;

    let peers = [
        local(dup, DeliveryMethod::Ihave),
        local(denied, DeliveryMethod::Post),
    ];
    let reports = deliver("<4@example.net>", "Subject: x\r\n\r\nbody\r\n", &peers, 1000, TIMEOUT)
        .await
        .unwrap();

    assert!(matches!(reports[0].outcome, DeliveryOutcome::TemporaryReject(_)));
    assert!(matches!(reports[1].outcome, DeliveryOutcome::PermanentReject(_)));
    assert!(dup_handle.await.unwrap().is_none());
    assert!(denied_handle.await.unwrap().is_none());
}

#[tokio::test]
async fn test_oversize_never_contacts_a_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let result = deliver(
        "<5@example.net>",
        "Subject: big\r\n\r\nbody\r\n",
        &[local(port, DeliveryMethod::Ihave)],
        10,
        TIMEOUT,
    )
    .await;

    assert!(matches!(result, Err(RejectReason::TooLarge { .. })));
    let accepted = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(accepted.is_err(), "peer was contacted");
}

#[tokio::test]
async fn test_email_to_peers() {
    let (alt, alt_handle) = mock_peer(ACCEPT_IHAVE).await;
    let (misc, _misc_handle) = mock_peer(ACCEPT_IHAVE).await;

    let mut config = GatewayConfig::default();
    config.nntp.path = "gate.example.net".to_string();
    config.peers = vec![
        PeerConfig::new(format!("127.0.0.1:{}", alt), Some(r"^alt\."), "ihave"),
        PeerConfig::new(format!("127.0.0.1:{}", misc), Some(r"^misc\."), "ihave"),
    ];
    let options = RunOptions {
        recipient: Some("mail2news-20230601-alt.test@gate.example.net".to_string()),
        ..RunOptions::default()
    };
    let now = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
    let raw = "From: Alice <alice@example.com>\n\
               Subject: hello\n\
               Message-ID: <e2e@example.com>\n\
               Received: from relay.example.com\n\
               \n\
               .leading dot\n\
               body\n";

    let prepared = process(raw, &options, &config, now, None).unwrap();
    assert_eq!(prepared.groups, vec!["alt.test"]);
    assert_eq!(prepared.peers.len(), 1);

    let reports = deliver(
        &prepared.message_id,
        &prepared.payload,
        &prepared.peers,
        config.thresholds.max_bytes,
        TIMEOUT,
    )
    .await
    .unwrap();
    assert_eq!(reports[0].outcome, DeliveryOutcome::Delivered);

    let article = alt_handle.await.unwrap().unwrap();
    assert!(article.contains("Newsgroups: alt.test\r\n"));
    assert!(article.contains("Message-ID: <e2e@example.com>\r\n"));
    assert!(article.contains("Path: gate.example.net\r\n"));
    assert!(!article.contains("Received:"));
    assert!(article.ends_with("\r\n\r\n..leading dot\r\nbody\r\n"));
}
