//! Low-level I/O for the NNTP client
//!
//! Commands and article payloads are written whole and flushed; responses
//! are read one status line at a time under the client's I/O timeout.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tracing::trace;

use super::NntpClient;
use super::state::ConnectionState;
use crate::commands;
use crate::error::{NntpError, Result};
use crate::response::NntpResponse;

/// Initial capacity for a status line
const STATUS_LINE_CAPACITY: usize = 512;

impl NntpClient {
    /// Send a command to the server
    pub(super) async fn send_command(&mut self, command: &str) -> Result<()> {
        trace!("Sending command: {}", command.trim());
        self.write_flush(command.as_bytes()).await
    }

    /// Send a wire-format article followed by the terminating dot line
    ///
    /// `wire` must already use CRLF line endings and be dot-stuffed.
    pub(super) async fn send_article(&mut self, wire: &str) -> Result<()> {
        trace!("Sending article of {} bytes", wire.len());
        let stream = self.stream.get_mut();
        stream.write_all(wire.as_bytes()).await?;
        if !wire.is_empty() && !wire.ends_with("\r\n") {
            stream.write_all(b"\r\n").await?;
        }
        self.write_flush(commands::end_of_article().as_bytes()).await
    }

    async fn write_flush(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Read a single-line response
    pub(super) async fn read_response(&mut self) -> Result<NntpResponse> {
        let io_timeout = self.io_timeout;
        let read_future = async {
            let mut line_bytes = Vec::with_capacity(STATUS_LINE_CAPACITY);
            self.stream.read_until(b'\n', &mut line_bytes).await?;

            if line_bytes.is_empty() {
                return Err(NntpError::ConnectionClosed);
            }

            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end();
            trace!("Received: {}", line);

            commands::parse_single_response(line)
        };

        let result = timeout(io_timeout, read_future)
            .await
            .map_err(|_| NntpError::Timeout)?;

        if let Err(NntpError::ConnectionClosed) = &result {
            self.state = ConnectionState::Closed;
        }
        result
    }
}
