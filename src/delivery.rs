//! Article delivery to upstream peers
//!
//! Peers are tried one after another in configuration order. Each attempt
//! is independent: its own connection, its own timeout, its own outcome.
//! Nothing is retried and a failure at one peer never stops the next.

use std::fmt;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::client::NntpClient;
use crate::error::{NntpError, RejectReason};
use crate::response::ResponseClass;
use crate::router::{DeliveryMethod, Peer};

/// What happened at one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Peer accepted the article
    Delivered,
    /// Peer refused with a 4xx code
    TemporaryReject(String),
    /// Peer refused with a 5xx code
    PermanentReject(String),
    /// Connection or protocol failure
    TransportError(String),
}

impl DeliveryOutcome {
    /// Classify the result of an attempt
    ///
    /// Server refusals are split on the first digit of their code; anything
    /// without a 4xx or 5xx code is a transport failure.
    pub fn from_result(result: crate::Result<()>) -> Self {
        let err = match result {
            Ok(()) => return Self::Delivered,
            Err(err) => err,
        };

        match err.code().map(ResponseClass::of) {
            Some(ResponseClass::Temporary) => Self::TemporaryReject(err.to_string()),
            Some(ResponseClass::Permanent) => Self::PermanentReject(err.to_string()),
            _ => Self::TransportError(err.to_string()),
        }
    }

    /// Whether the peer took the article
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => f.write_str("delivered"),
            Self::TemporaryReject(msg) => write!(f, "temporary reject: {}", msg),
            Self::PermanentReject(msg) => write!(f, "permanent reject: {}", msg),
            Self::TransportError(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

/// Outcome of delivery to one peer
#[derive(Debug, Clone)]
pub struct PeerReport {
    /// `host:port`
    pub peer: String,
    /// Command used
    pub method: DeliveryMethod,
    /// Result
    pub outcome: DeliveryOutcome,
}

/// Refuse payloads larger than `max_bytes`
pub fn check_size(payload: &str, max_bytes: usize) -> Result<(), RejectReason> {
    let size = payload.len();
    if size > max_bytes {
        warn!("Message exceeds {} size limit. Rejecting", max_bytes);
        return Err(RejectReason::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    debug!("Message is {} bytes", size);
    Ok(())
}

/// Deliver `payload` to every peer in turn
///
/// The size limit is checked before any peer is contacted. Each attempt,
/// from connect to the final reply, must finish within `attempt_timeout`.
pub async fn deliver(
    message_id: &str,
    payload: &str,
    peers: &[Peer],
    max_bytes: usize,
    attempt_timeout: Duration,
) -> Result<Vec<PeerReport>, RejectReason> {
    check_size(payload, max_bytes)?;

    let mut reports = Vec::with_capacity(peers.len());
    for peer in peers {
        debug!("Attempting delivery to {}", peer);

        let result = timeout(
            attempt_timeout,
            attempt(peer, message_id, payload, attempt_timeout),
        )
        .await
        .unwrap_or(Err(NntpError::Timeout));

        let outcome = DeliveryOutcome::from_result(result);
        log_outcome(peer, message_id, &outcome);

        reports.push(PeerReport {
            peer: peer.to_string(),
            method: peer.method,
            outcome,
        });
    }

    Ok(reports)
}

async fn attempt(
    peer: &Peer,
    message_id: &str,
    payload: &str,
    io_timeout: Duration,
) -> crate::Result<()> {
    let mut client = NntpClient::connect(&peer.host, peer.port, peer.tls(), io_timeout).await?;

    let result = match peer.method {
        DeliveryMethod::Ihave => client.ihave(message_id, payload).await,
        DeliveryMethod::Post => match client.mode_reader().await {
            Ok(()) => client.post(payload).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = client.quit().await {
        debug!("QUIT to {} failed: {}", peer, e);
    }

    result
}

fn log_outcome(peer: &Peer, message_id: &str, outcome: &DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Delivered => {
            info!("{} successful delivery of {} to {}", peer.method, message_id, peer);
        }
        DeliveryOutcome::TemporaryReject(msg) => {
            info!("{} temporary reject from {}: {}", peer.method, peer, msg);
        }
        DeliveryOutcome::PermanentReject(msg) => {
            warn!("{} permanent reject from {}: {}", peer.method, peer, msg);
        }
        DeliveryOutcome::TransportError(msg) => {
            error!("{} delivery to {} failed: {}", peer.method, peer, msg);
        }
    }
}
