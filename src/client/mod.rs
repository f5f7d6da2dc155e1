//! Minimal async NNTP client for handing articles to upstream peers
//!
//! Supports plain NNTP and NNTP over TLS (port 563), the IHAVE and POST
//! transfer commands and little else. Each gateway run opens one short
//! connection per peer.

mod connection;
mod io;
mod posting;
mod state;

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tracing::debug;

use state::ConnectionState;

/// Byte stream an NNTP session runs over, plain or TLS
pub(crate) trait NntpStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> NntpStream for T {}

/// Async NNTP client
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use mail2news::NntpClient;
///
/// # async fn example() -> mail2news::Result<()> {
/// let wire = "From: a@b.example\r\nNewsgroups: alt.test\r\n\r\nhello\r\n";
/// let mut client = NntpClient::connect("news.example.com", 119, false, Duration::from_secs(10)).await?;
/// client.ihave("<id@b.example>", wire).await?;
/// client.quit().await?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct NntpClient {
    /// Buffered plain or TLS stream
    stream: BufReader<Box<dyn NntpStream>>,
    /// Session state
    state: ConnectionState,
    /// `host:port`, for log lines
    peer: String,
    /// Limit on each single-line read
    io_timeout: Duration,
    /// Greeting was 200 rather than 201
    posting_allowed: bool,
}

impl NntpClient {
    /// `host:port` this client is connected to
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Whether the greeting advertised posting
    ///
    /// Servers commonly answer 201 to transit peers and still accept IHAVE,
    /// so this is informational only.
    pub fn posting_allowed(&self) -> bool {
        self.posting_allowed
    }

    /// Whether QUIT has been sent or the server closed the session
    pub fn is_closed(&self) -> bool {
        matches!(self.state, ConnectionState::Closed)
    }
}

impl Drop for NntpClient {
    fn drop(&mut self) {
        debug!("NntpClient for {} dropped", self.peer);
    }
}
