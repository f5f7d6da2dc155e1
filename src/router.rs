//! Peer selection
//!
//! A peer is chosen only when every newsgroup in the distribution matches
//! its pattern. Partial matches do not count: a peer carrying `alt.*` must
//! not be handed a crosspost to `alt.test,local.test`, since it would either
//! refuse it or propagate the local group.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::PeerConfig;

/// Default NNTP port
pub const NNTP_PORT: u16 = 119;

/// NNTP over TLS port
pub const NNTPS_PORT: u16 = 563;

/// NNTP command used to hand an article to a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMethod {
    /// Server-to-server transfer (RFC 3977 §6.3.2)
    Ihave,
    /// Reader posting (RFC 3977 §6.3.1)
    Post,
}

impl FromStr for DeliveryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ihave" => Ok(DeliveryMethod::Ihave),
            "post" => Ok(DeliveryMethod::Post),
            other => Err(format!("unknown delivery method: {}", other)),
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMethod::Ihave => f.write_str("IHAVE"),
            DeliveryMethod::Post => f.write_str("POST"),
        }
    }
}

/// An upstream news server ready for delivery
#[derive(Debug, Clone)]
pub struct Peer {
    /// Host name or address
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Newsgroups this peer accepts; `None` accepts everything
    pub pattern: Option<Regex>,
    /// How articles are handed over
    pub method: DeliveryMethod,
}

impl Peer {
    /// Build a peer from a `host`, `host:port` or `[ipv6]:port` identifier
    ///
    /// A bare IPv6 literal such as `::1` takes the default port.
    ///
    /// # Examples
    ///
    /// ```
    /// use mail2news::router::{DeliveryMethod, Peer};
    ///
    /// let peer = Peer::parse("news.example.net:563", None, DeliveryMethod::Post).unwrap();
    /// assert_eq!(peer.port, 563);
    /// assert!(peer.tls());
    ///
    /// let peer = Peer::parse("news.example.net", None, DeliveryMethod::Ihave).unwrap();
    /// assert_eq!(peer.port, 119);
    /// ```
    pub fn parse(
        host: &str,
        pattern: Option<Regex>,
        method: DeliveryMethod,
    ) -> Result<Self, String> {
        let host = host.trim();
        let bad_port = || format!("invalid port in {}", host);
        let (name, port) = if let Some(rest) = host.strip_prefix('[') {
            // [2001:db8::1] or [2001:db8::1]:119
            let (name, after) = rest
                .split_once(']')
                .ok_or_else(|| format!("unclosed bracket in {}", host))?;
            let port = match after {
                "" => NNTP_PORT,
                _ => after
                    .strip_prefix(':')
                    .and_then(|p| p.parse::<u16>().ok())
                    .ok_or_else(bad_port)?,
            };
            (name, port)
        } else if host.matches(':').count() > 1 {
            // Bare IPv6 literal, no port
            (host, NNTP_PORT)
        } else {
            match host.rsplit_once(':') {
                Some((name, port)) => (name, port.parse::<u16>().map_err(|_| bad_port())?),
                None => (host, NNTP_PORT),
            }
        };

        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(format!("invalid host: {:?}", host));
        }

        Ok(Self {
            host: name.to_string(),
            port,
            pattern,
            method,
        })
    }

    /// Whether the connection is NNTP over TLS
    pub fn tls(&self) -> bool {
        self.port == NNTPS_PORT
    }

    /// Whether every group in `groups` matches this peer's pattern
    pub fn accepts(&self, groups: &[String]) -> bool {
        match &self.pattern {
            Some(pattern) => groups.iter().all(|g| pattern.is_match(g)),
            None => true,
        }
    }

    fn from_config(config: &PeerConfig) -> Result<Self, String> {
        let method = config.method.parse::<DeliveryMethod>()?;
        let pattern = config
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| format!("bad pattern: {}", e))?;
        Self::parse(&config.host, pattern, method)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Peers from `table` that accept every group in `groups`, in table order
///
/// Misconfigured entries are logged and skipped.
pub fn select_peers(table: &[PeerConfig], groups: &[String]) -> Vec<Peer> {
    let mut selected = Vec::new();

    for entry in table {
        let peer = match Peer::from_config(entry) {
            Ok(peer) => peer,
            Err(e) => {
                warn!("Skipping misconfigured peer {:?}: {}", entry.host, e);
                continue;
            }
        };

        if peer.accepts(groups) {
            debug!("Peer {} accepts all groups, using {}", peer, peer.method);
            selected.push(peer);
        } else {
            debug!("Peer {} does not accept every group", peer);
        }
    }

    if selected.is_empty() {
        warn!("No peer accepts newsgroups {}", groups.join(","));
    } else {
        info!(
            "Selected peers: {}",
            selected
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    selected
}

/// The single peer named by a posting-host directive, always using POST
pub fn override_peer(host: &str) -> Result<Peer, String> {
    Peer::parse(host, None, DeliveryMethod::Post)
}
