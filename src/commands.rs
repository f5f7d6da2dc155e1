//! NNTP command builders and status line parsing
//!
//! The gateway only ever speaks five commands: MODE READER, POST, IHAVE,
//! QUIT and the implicit greeting read. Builders return the full line
//! including CRLF.

use crate::error::{NntpError, Result};
use crate::response::NntpResponse;

/// Longest excerpt of a bad status line kept in an error
const MAX_ERROR_EXCERPT: usize = 100;

/// Build MODE READER command (RFC 3977 §5.3)
///
/// Sent before POST: some servers only accept posting in reader mode.
pub fn mode_reader() -> &'static str {
    "MODE READER\r\n"
}

/// Build POST command (RFC 3977 §6.3.1)
pub fn post() -> &'static str {
    "POST\r\n"
}

/// Build IHAVE command (RFC 3977 §6.3.2)
///
/// # Examples
///
/// ```
/// use mail2news::commands::ihave;
///
/// assert_eq!(ihave("<a@b>"), "IHAVE <a@b>\r\n");
/// ```
pub fn ihave(message_id: &str) -> String {
    format!("IHAVE {}\r\n", message_id)
}

/// Build QUIT command (RFC 3977 §5.4)
pub fn quit() -> &'static str {
    "QUIT\r\n"
}

/// Line terminating an article sent after 335 or 340
pub fn end_of_article() -> &'static str {
    ".\r\n"
}

/// Parse an NNTP status line into code and text
///
/// The code must be exactly three digits. A UTF-8 BOM in front of the line
/// is tolerated, as is a missing space after the code.
pub fn parse_response_line(line: &str) -> Result<(u16, String)> {
    let line = line.trim_start_matches('\u{FEFF}');
    let bad = || NntpError::InvalidResponse(line.chars().take(MAX_ERROR_EXCERPT).collect());

    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(bad());
    }
    // "2000 text" would otherwise read as 200
    if bytes.get(3).is_some_and(u8::is_ascii_digit) {
        return Err(bad());
    }

    let code = line[..3].parse::<u16>().map_err(|_| bad())?;
    let rest = &line[3..];
    let message = rest.strip_prefix(' ').unwrap_or(rest).to_string();

    Ok((code, message))
}

/// Parse a single-line NNTP response
pub fn parse_single_response(line: &str) -> Result<NntpResponse> {
    let (code, message) = parse_response_line(line)?;
    Ok(NntpResponse { code, message })
}
