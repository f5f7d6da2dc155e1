//! Connection state for the NNTP client

/// Where an NNTP session stands
///
/// MODE READER moves a session from `Ready` to `Reader`; it is only sent
/// ahead of POST. QUIT or a server-side close ends in `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ConnectionState {
    /// Greeting accepted
    Ready,
    /// MODE READER acknowledged
    Reader,
    /// No further commands possible
    Closed,
}
