use tracing::debug;

use super::NntpClient;
use super::state::ConnectionState;
use crate::commands;
use crate::response::codes;
use crate::{NntpError, Result};

impl NntpClient {
    /// Switch the session to reader mode (RFC 3977 §5.3)
    ///
    /// Servers without a separate reader mode answer 5xx; that is logged and
    /// otherwise ignored, since POST may still work.
    pub async fn mode_reader(&mut self) -> Result<()> {
        self.send_command(commands::mode_reader()).await?;
        let response = self.read_response().await?;

        match response.code {
            codes::READY_POSTING_ALLOWED | codes::READY_NO_POSTING => {
                self.posting_allowed = response.code == codes::READY_POSTING_ALLOWED;
                self.state = ConnectionState::Reader;
            }
            code => debug!(
                "{} ignored MODE READER ({} {})",
                self.peer, code, response.message
            ),
        }
        Ok(())
    }

    /// Post an article (RFC 3977 §6.3.1)
    ///
    /// # Two-Phase Protocol
    ///
    /// 1. Client sends POST
    /// 2. Server responds 340 (send article) or 440 (posting not permitted)
    /// 3. Client sends the article and the terminating dot line
    /// 4. Server responds 240 (posted) or 441 (posting failed)
    ///
    /// `wire` is the dot-stuffed, CRLF article without the terminating line.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::PostingNotPermitted`] - Server does not allow posting (440)
    /// - [`NntpError::PostingFailed`] - Server rejected the article (441)
    /// - [`NntpError::Protocol`] - Server returned any other unexpected code
    /// - [`NntpError::Timeout`] - Server did not respond in time
    pub async fn post(&mut self, wire: &str) -> Result<()> {
        debug!("Posting article to {}", self.peer);

        // Phase 1: Send POST command
        self.send_command(commands::post()).await?;
        let response = self.read_response().await?;

        match response.code {
            codes::SEND_ARTICLE => {}
            codes::POSTING_NOT_PERMITTED => {
                return Err(NntpError::PostingNotPermitted(response.message));
            }
            code => {
                return Err(NntpError::Protocol {
                    code,
                    message: response.message,
                });
            }
        }

        // Phase 2: Send article text
        self.send_article(wire).await?;
        let response = self.read_response().await?;

        match response.code {
            codes::ARTICLE_POSTED => {
                debug!("Article posted to {}", self.peer);
                Ok(())
            }
            codes::POSTING_FAILED => Err(NntpError::PostingFailed(response.message)),
            code => Err(NntpError::Protocol {
                code,
                message: response.message,
            }),
        }
    }

    /// Offer an article by Message-ID and transfer it (RFC 3977 §6.3.2)
    ///
    /// # Two-Phase Protocol
    ///
    /// 1. Client sends `IHAVE <message-id>`
    /// 2. Server responds 335 (send it), 435 (not wanted) or 436 (try later)
    /// 3. Client sends the article and the terminating dot line
    /// 4. Server responds 235 (transferred), 436 (try later) or 437 (rejected)
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `ArticleNotWanted` (code 435) - Server doesn't want the article
    /// - `TransferNotPossible` (code 436) - Temporary failure
    /// - `TransferRejected` (code 437) - Permanent rejection
    /// - `Protocol` - Other protocol errors
    pub async fn ihave(&mut self, message_id: &str, wire: &str) -> Result<()> {
        debug!("IHAVE: offering {} to {}", message_id, self.peer);

        // Phase 1: Offer the Message-ID
        self.send_command(&commands::ihave(message_id)).await?;
        let response = self.read_response().await?;

        match response.code {
            codes::SEND_ARTICLE_TRANSFER => {
                debug!("Server wants article (code 335), sending...");
            }
            codes::ARTICLE_NOT_WANTED => {
                return Err(NntpError::ArticleNotWanted(response.message));
            }
            codes::TRANSFER_NOT_POSSIBLE => {
                return Err(NntpError::TransferNotPossible(response.message));
            }
            code => {
                return Err(NntpError::Protocol {
                    code,
                    message: response.message,
                });
            }
        }

        // Phase 2: Send article text
        self.send_article(wire).await?;
        let response = self.read_response().await?;

        match response.code {
            codes::ARTICLE_TRANSFERRED => {
                debug!("Article transferred to {} (code 235)", self.peer);
                Ok(())
            }
            codes::TRANSFER_NOT_POSSIBLE => Err(NntpError::TransferNotPossible(response.message)),
            codes::TRANSFER_REJECTED => Err(NntpError::TransferRejected(response.message)),
            code => Err(NntpError::Protocol {
                code,
                message: response.message,
            }),
        }
    }

    /// Close the session (RFC 3977 §5.4)
    ///
    /// The 205 reply is read but not required.
    pub async fn quit(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        debug!("Closing NNTP connection to {}", self.peer);

        self.send_command(commands::quit()).await?;
        self.state = ConnectionState::Closed;
        let response = self.read_response().await?;
        if response.code != codes::CLOSING_CONNECTION {
            debug!("Unexpected QUIT reply {} {}", response.code, response.message);
        }
        Ok(())
    }
}
