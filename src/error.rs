//! Gateway error types

use thiserror::Error;

/// NNTP protocol and connection errors
#[derive(Error, Debug)]
pub enum NntpError {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS error during secure connection
    #[error("TLS error: {0}")]
    Tls(String),

    /// Connection or operation timeout
    #[error("Connection timeout")]
    Timeout,

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// NNTP protocol error with response code
    #[error("NNTP error {code}: {message}")]
    Protocol {
        /// NNTP response code (e.g., 435, 441, 502)
        code: u16,
        /// Error message from server
        message: String,
    },

    /// Posting not permitted (440)
    #[error("Posting not permitted: {0}")]
    PostingNotPermitted(String),

    /// Posting failed (441)
    #[error("Posting failed: {0}")]
    PostingFailed(String),

    /// Article not wanted (435)
    #[error("Article not wanted: {0}")]
    ArticleNotWanted(String),

    /// Transfer not possible; try again later (436)
    #[error("Transfer not possible: {0}")]
    TransferNotPossible(String),

    /// Transfer rejected; do not retry (437)
    #[error("Transfer rejected: {0}")]
    TransferRejected(String),

    /// Connection closed unexpectedly
    #[error("Connection closed")]
    ConnectionClosed,
}

impl NntpError {
    /// Response code carried by a server rejection, if any
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Protocol { code, .. } => Some(*code),
            Self::PostingNotPermitted(_) => Some(440),
            Self::PostingFailed(_) => Some(441),
            Self::ArticleNotWanted(_) => Some(435),
            Self::TransferNotPossible(_) => Some(436),
            Self::TransferRejected(_) => Some(437),
            _ => None,
        }
    }
}

/// Result type alias using NntpError
pub type Result<T> = std::result::Result<T, NntpError>;

/// Process-level failures that abort the gateway before or outside message handling
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration could not be loaded or is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),

    /// Local file IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Active-file download failed
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// NNTP failure outside per-peer delivery
    #[error(transparent)]
    Nntp(#[from] NntpError),
}

/// Why a message was refused by the gateway
///
/// Every variant terminates processing of the current message. Only
/// [`RejectReason::InvalidPath`] is fatal to the process; the rest are
/// silent, log-only rejections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// No newsgroup source: no override, no Newsgroups header, no encoded recipient
    #[error("badly formatted recipient {0}")]
    BadRecipient(String),

    /// Recipient date stamp is malformed or outside the accepted window
    #[error("timestamp {0} is malformed or out of bounds")]
    StaleOrInvalidTimestamp(String),

    /// Every candidate newsgroup failed validation
    #[error("no valid newsgroups")]
    NoValidNewsgroups,

    /// More distinct valid newsgroups than the crosspost limit
    #[error("{count} newsgroups exceeds crosspost limit of {limit}")]
    CrosspostLimitExceeded {
        /// Number of valid newsgroups
        count: usize,
        /// Configured limit
        limit: usize,
    },

    /// Message carries a blacklisted header
    #[error("blacklisted {0} header")]
    PoisonHeader(String),

    /// Relay HELO matched a blacklisted string
    #[error("blacklisted relay HELO matching '{0}'")]
    PoisonHelo(String),

    /// From header matched a blacklisted string
    #[error("blacklisted From matching '{0}'")]
    PoisonFrom(String),

    /// Newsgroups header matched a blacklisted string
    #[error("blacklisted newsgroup '{0}' in distribution")]
    PoisonNewsgroup(String),

    /// Distribution includes a moderated newsgroup
    #[error("moderated newsgroup {0} in distribution")]
    ModeratedGroup(String),

    /// Serialized article is larger than the configured limit
    #[error("message of {size} bytes exceeds {limit} byte limit")]
    TooLarge {
        /// Serialized size
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// Path header value cannot be set
    #[error("cannot assign Path header '{0}'")]
    InvalidPath(String),
}

impl RejectReason {
    /// Whether this rejection must abort the process with a failure status
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidPath(_))
    }
}
