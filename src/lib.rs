#![doc = include_str!("../README.md")]

/// Command-line interface
pub mod cli;
mod client;
/// NNTP command builders and status line parsing
pub mod commands;
/// Configuration file and defaults
pub mod config;
/// Article delivery to upstream peers
pub mod delivery;
mod error;
/// Daily history of inbound messages
pub mod history;
/// Hashed Subject (hSub) utility
pub mod hsub;
/// Daily log file setup
pub mod logging;
/// Email message representation
pub mod message;
/// Moderated newsgroup lookup
pub mod moderated;
/// Validation, policy, rewrite and routing without I/O
pub mod pipeline;
/// Abuse policy checks
pub mod policy;
/// Recipient and destination resolution
pub mod recipient;
/// NNTP response types and status codes
pub mod response;
/// Header rewriting
pub mod rewrite;
/// Peer selection
pub mod router;
/// Message-ID and newsgroup validation
pub mod validation;

pub use client::NntpClient;
pub use config::{GatewayConfig, PeerConfig, RunOptions};
pub use delivery::{DeliveryOutcome, PeerReport, deliver};
pub use error::{GatewayError, NntpError, RejectReason, Result};
pub use message::{Headers, Message};
pub use moderated::ModeratedGroups;
pub use pipeline::{Prepared, process};
pub use policy::ModerationCheck;
pub use response::{NntpResponse, ResponseClass, codes};
pub use router::{DeliveryMethod, Peer};
