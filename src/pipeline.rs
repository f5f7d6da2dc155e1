//! The gateway pipeline up to, but not including, delivery
//!
//! Stages run in order and any rejection stops the message:
//! normalize, resolve destination, validate newsgroups, policy checks,
//! rewrite, route, size check. Everything here is synchronous and free of
//! I/O; the clock is passed in.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::{GatewayConfig, RunOptions};
use crate::delivery::check_size;
use crate::error::RejectReason;
use crate::message::{Message, normalize};
use crate::policy::{ModerationCheck, check_policy};
use crate::recipient::resolve_destination;
use crate::rewrite::rewrite;
use crate::router::{Peer, override_peer, select_peers};
use crate::validation::validate_newsgroups;

/// A message that passed every check and is ready for delivery
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Message-ID offered to IHAVE peers
    pub message_id: String,
    /// The rewritten message
    pub message: Message,
    /// Validated distribution
    pub groups: Vec<String>,
    /// Peers to deliver to, in order
    pub peers: Vec<Peer>,
    /// Wire form of `message`, without the terminating dot line
    pub payload: String,
}

/// Run raw message text through the pipeline
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use mail2news::config::{GatewayConfig, PeerConfig, RunOptions};
/// use mail2news::pipeline::process;
///
/// let mut config = GatewayConfig::default();
/// config.peers.push(PeerConfig::new("news.example.net", None, "ihave"));
///
/// let raw = "From: a@b.example\nSubject: hi\nNewsgroups: alt.test\nMessage-ID: <1@b.example>\n\nhello\n";
/// let now = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
/// let prepared = process(raw, &RunOptions::default(), &config, now, None).unwrap();
///
/// assert_eq!(prepared.groups, vec!["alt.test"]);
/// assert_eq!(prepared.peers.len(), 1);
/// assert!(prepared.payload.contains("Newsgroups: alt.test\r\n"));
/// ```
pub fn process(
    raw: &str,
    options: &RunOptions,
    config: &GatewayConfig,
    now: DateTime<Utc>,
    moderation: Option<&dyn ModerationCheck>,
) -> Result<Prepared, RejectReason> {
    let message = normalize(raw, &config.nntp.path, now);
    prepare(message, options, config, now, moderation)
}

/// Run an already parsed message through the pipeline
pub fn prepare(
    mut message: Message,
    options: &RunOptions,
    config: &GatewayConfig,
    now: DateTime<Utc>,
    moderation: Option<&dyn ModerationCheck>,
) -> Result<Prepared, RejectReason> {
    let destination = resolve_destination(&mut message, options, &config.thresholds, now)?;

    let validated = validate_newsgroups(&destination.newsgroups, config.thresholds.max_crossposts)?;
    message.headers.append("Newsgroups", validated.header.as_str());

    check_policy(
        &message,
        options.helo.as_deref(),
        &validated.header,
        &validated.groups,
        &config.filters,
        moderation,
    )?;

    let newsserver = rewrite(
        &mut message,
        destination.anonymize,
        &config.nntp,
        &config.filters,
        now,
    )?;

    let peers = match newsserver {
        Some(host) => match override_peer(&host) {
            Ok(peer) => {
                info!("Posting host directive overrides peer table: {}", peer);
                vec![peer]
            }
            Err(e) => {
                warn!("Unusable posting host directive {:?}: {}", host, e);
                Vec::new()
            }
        },
        None => select_peers(&config.peers, &validated.groups),
    };

    let payload = message.to_wire();
    check_size(&payload, config.thresholds.max_bytes)?;

    let message_id = message.message_id().unwrap_or_default().to_string();

    Ok(Prepared {
        message_id,
        message,
        groups: validated.groups,
        peers,
        payload,
    })
}
