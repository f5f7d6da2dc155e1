//! NNTP response types and status codes

/// NNTP single-line response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NntpResponse {
    /// 3-digit NNTP response code
    pub code: u16,
    /// Status message from server
    pub message: String,
}

/// Broad meaning of a response code (RFC 3977 §3.2.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx
    Success,
    /// 3xx
    Continuation,
    /// 4xx: the command was correct but could not be performed now
    Temporary,
    /// 5xx: the command is not going to work
    Permanent,
    /// Anything else
    Unknown,
}

impl ResponseClass {
    /// Classify a response code
    ///
    /// # Examples
    ///
    /// ```
    /// use mail2news::response::ResponseClass;
    ///
    /// assert_eq!(ResponseClass::of(240), ResponseClass::Success);
    /// assert_eq!(ResponseClass::of(436), ResponseClass::Temporary);
    /// assert_eq!(ResponseClass::of(502), ResponseClass::Permanent);
    /// ```
    pub fn of(code: u16) -> Self {
        match code {
            200..=299 => Self::Success,
            300..=399 => Self::Continuation,
            400..=499 => Self::Temporary,
            500..=599 => Self::Permanent,
            _ => Self::Unknown,
        }
    }
}

impl NntpResponse {
    /// Broad meaning of this response
    pub fn class(&self) -> ResponseClass {
        ResponseClass::of(self.code)
    }

    /// Check if response indicates success (2xx)
    pub fn is_success(&self) -> bool {
        self.class() == ResponseClass::Success
    }

    /// Check if response indicates error (4xx or 5xx)
    pub fn is_error(&self) -> bool {
        matches!(self.class(), ResponseClass::Temporary | ResponseClass::Permanent)
    }
}

/// NNTP response codes used on the posting path (RFC 3977)
pub mod codes {
    /// Server ready, posting allowed
    pub const READY_POSTING_ALLOWED: u16 = 200;
    /// Server ready, no posting
    pub const READY_NO_POSTING: u16 = 201;
    /// Closing connection
    pub const CLOSING_CONNECTION: u16 = 205;
    /// Article transferred OK (RFC 3977 §6.3.2)
    pub const ARTICLE_TRANSFERRED: u16 = 235;
    /// Article posted successfully (RFC 3977 §6.3.1)
    pub const ARTICLE_POSTED: u16 = 240;

    /// Send article to be transferred (RFC 3977 §6.3.2)
    pub const SEND_ARTICLE_TRANSFER: u16 = 335;
    /// Send article to be posted
    pub const SEND_ARTICLE: u16 = 340;

    /// Service temporarily unavailable
    pub const SERVICE_UNAVAILABLE: u16 = 400;
    /// Article not wanted
    pub const ARTICLE_NOT_WANTED: u16 = 435;
    /// Transfer not possible; try again later
    pub const TRANSFER_NOT_POSSIBLE: u16 = 436;
    /// Transfer rejected; do not retry
    pub const TRANSFER_REJECTED: u16 = 437;
    /// Posting not permitted
    pub const POSTING_NOT_PERMITTED: u16 = 440;
    /// Posting failed
    pub const POSTING_FAILED: u16 = 441;
    /// Authentication required
    pub const AUTH_REQUIRED: u16 = 480;

    /// Command not recognized
    pub const COMMAND_NOT_RECOGNIZED: u16 = 500;
    /// Access denied
    pub const ACCESS_DENIED: u16 = 502;
}
