//! Message parsing functions
//!
//! This module contains functions for parsing raw email text into an ordered
//! header list and a body.

use super::types::{Headers, Message};

/// Split raw message text into headers and body
///
/// Splits at the first blank line (CRLF CRLF or LF LF), whichever comes first.
/// Returns (headers_text, body_text) tuple.
pub fn split_message(raw: &str) -> (&str, &str) {
    let crlf = raw.find("\r\n\r\n").map(|pos| (pos, 4));
    let lf = raw.find("\n\n").map(|pos| (pos, 2));

    let separator = match (crlf, lf) {
        (Some(c), Some(l)) => Some(if c.0 <= l.0 { c } else { l }),
        (c, l) => c.or(l),
    };

    match separator {
        Some((pos, len)) => (&raw[..pos], &raw[pos + len..]),
        // No separator found - entire text is headers
        None => (raw, ""),
    }
}

/// Unfold header value by removing continuation line breaks
///
/// RFC 5322 §2.2.3: unfolding removes each CRLF (or bare LF) that precedes
/// whitespace; the whitespace itself is kept. Leading and trailing
/// whitespace of the whole value is trimmed.
pub fn unfold_header(value: &str) -> String {
    value
        .chars()
        .filter(|&ch| ch != '\r' && ch != '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

/// A header name per RFC 5322: printable ASCII except colon, no whitespace
fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| (33..=126).contains(&b) && b != b':')
}

/// Parse a header block into ordered fields
///
/// - Continuation lines are folded into the preceding field
/// - Lines that are not `name: value` are ignored
/// - A leading mbox `From ` envelope line is ignored
pub fn parse_headers(headers_text: &str) -> Headers {
    let mut headers = Headers::new();
    let mut current: Option<(String, String)> = None;

    for (index, line) in headers_text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        if index == 0 && line.starts_with("From ") {
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = current.as_mut() {
                value.push('\n');
                value.push_str(line);
            }
            continue;
        }

        if let Some((name, value)) = current.take() {
            headers.append(name, unfold_header(&value));
        }

        if let Some(colon_pos) = line.find(':') {
            let name = line[..colon_pos].trim_end();
            if is_field_name(name) {
                current = Some((name.to_string(), line[colon_pos + 1..].trim_start().to_string()));
            }
        }
    }

    if let Some((name, value)) = current {
        headers.append(name, unfold_header(&value));
    }

    headers
}

/// Parse a complete message from raw text
///
/// # Examples
///
/// ```
/// use mail2news::message::parse_message;
///
/// let message = parse_message("Subject: Hello\r\n  world\r\nTo: a@b\r\n\r\nBody\r\n");
/// assert_eq!(message.headers.get("Subject"), Some("Hello  world"));
/// assert_eq!(message.body, "Body\r\n");
/// ```
pub fn parse_message(raw: &str) -> Message {
    let (headers_text, body_text) = split_message(raw);
    Message::new(parse_headers(headers_text), body_text)
}
