//! Header rewriting
//!
//! Runs after the policy checks have passed. Transformations are applied in
//! a fixed order:
//!
//! 1. Strip headers on the removal list
//! 2. Anonymize the sender when requested
//! 3. Insert Date, From and Subject when missing
//! 4. Set Path (fatal if the configured value is unusable)
//! 5. Set X-Abuse-Contact
//! 6. Honor an X-Newsserver posting-host directive
//! 7. Remove delimiter strings from the decoded payload of single-part bodies

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use mailparse::MailParseError;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::{FilterConfig, NntpConfig};
use crate::error::RejectReason;
use crate::message::Message;

/// Header naming a posting host that overrides the peer table
pub const NEWSSERVER_HEADER: &str = "X-Newsserver";

/// Address put in From when the real one is moved aside
pub const ANONYMOUS_ADDRESS: &str = "<Use-Author-Supplied-Address-Header@[127.1]>";

/// Highest numbered Comments header tried before giving up
const MAX_COMMENTS_INDEX: usize = 99;

/// Column at which re-encoded base64 bodies are wrapped
const BASE64_LINE_LEN: usize = 76;

static NAME_ANGLE_ADDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^<>]*)<([^<>\s]+@[^<>\s]+)>$").expect("name-addr grammar is a valid regex")
});

static ADDR_PAREN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^<>\s]+@[^<>\s]+)\s+\(([^()]*)\)$")
        .expect("addr-comment grammar is a valid regex")
});

static BARE_ADDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^<>\s]+@[^<>\s]+)$").expect("addr-spec grammar is a valid regex")
});

/// Split a From value into display name and escaped address
///
/// Three forms are understood, tried in this order: `Name <addr>`,
/// `addr (Name)` and a bare `addr`. The address comes back with `.` and `@`
/// spelled out so that harvesters cannot use it directly.
///
/// # Examples
///
/// ```
/// use mail2news::rewrite::from_parse;
///
/// let (name, addr) = from_parse("Joe User <joe@example.com>").unwrap();
/// assert_eq!(name, "Joe User ");
/// assert_eq!(addr, "joe<AT>example<DOT>com");
///
/// assert!(from_parse("not an address").is_none());
/// ```
pub fn from_parse(from: &str) -> Option<(String, String)> {
    let (name, addr) = if let Some(caps) = NAME_ANGLE_ADDR.captures(from) {
        (caps[1].to_string(), caps[2].to_string())
    } else if let Some(caps) = ADDR_PAREN_NAME.captures(from) {
        (caps[2].to_string(), caps[1].to_string())
    } else if let Some(caps) = BARE_ADDR.captures(from) {
        (String::new(), caps[1].to_string())
    } else {
        return None;
    };

    Some((name, addr.replace('.', "<DOT>").replace('@', "<AT>")))
}

/// Whether `path` can go into a Path header as-is
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && !path.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// Rewrite a message in place
///
/// Returns the posting host named by an X-Newsserver header, if any. The
/// caller must then deliver to that host alone, using POST.
pub fn rewrite(
    message: &mut Message,
    anonymize: bool,
    nntp: &NntpConfig,
    filters: &FilterConfig,
    now: DateTime<Utc>,
) -> Result<Option<String>, RejectReason> {
    strip_headers(message, &filters.remove_headers);

    if anonymize {
        anonymize_sender(message);
    }

    insert_defaults(message, &nntp.default_from, now);

    if let Some(path) = message.headers.get("Path") {
        info!("Message has a preloaded Path header of {}", path);
    }
    if !is_valid_path(&nntp.path) {
        return Err(RejectReason::InvalidPath(nntp.path.clone()));
    }
    message.headers.set("Path", nntp.path.as_str());

    match &nntp.abuse_contact {
        Some(contact) if !contact.trim().is_empty() => {
            message.headers.set("X-Abuse-Contact", contact.as_str());
        }
        _ => warn!("No abuse contact address is configured"),
    }

    let newsserver = posting_host_override(message);

    if message.is_multipart() {
        info!("Multipart message, bypassing payload parsing");
    } else {
        strip_body_delimiters(message, &filters.body_delimiters);
    }

    Ok(newsserver)
}

fn strip_headers(message: &mut Message, names: &[String]) {
    for name in names {
        let removed = message.headers.remove(name);
        if removed > 0 {
            debug!("Removed {} {} header(s)", removed, name);
        }
    }
}

fn anonymize_sender(message: &mut Message) {
    let Some((name, addr)) = message.headers.get("From").and_then(from_parse) else {
        info!("Cannot find an address in From, leaving it unchanged");
        return;
    };

    message.headers.remove("Author-Supplied-Address");
    message.headers.remove("From");
    message.headers.append("Author-Supplied-Address", addr);
    message
        .headers
        .append("From", format!("{}{}", name, ANONYMOUS_ADDRESS));
    info!("Sender address moved to Author-Supplied-Address");
}

fn insert_defaults(message: &mut Message, default_from: &str, now: DateTime<Utc>) {
    if !message.headers.contains("Date") {
        info!("Message has no Date header. Inserting current timestamp");
        message.headers.append("Date", now.to_rfc2822());
    }

    match message.headers.get("From") {
        Some(from) => info!("From: {}", from),
        None => {
            info!("Message has no From header. Inserting a null one");
            message.headers.append("From", default_from);
        }
    }

    match message.headers.get("Subject") {
        Some(subject) => info!("Subject: {}", subject),
        None => {
            info!("Message has no Subject header. Inserting a null one");
            message.headers.append("Subject", "None");
        }
    }
}

/// Handle an X-Newsserver directive, returning the named host
fn posting_host_override(message: &mut Message) -> Option<String> {
    let host = message.headers.get(NEWSSERVER_HEADER)?.trim().to_string();
    if host.is_empty() {
        return None;
    }
    info!("Message directs posting to {}. Adding Comments header", host);

    let comment = format!(
        "A user of this Mail2News Gateway has issued a directive to force posting \
         through {}. If this is undesirable, please contact the administrator at \
         the supplied abuse address.",
        host
    );

    let slot = std::iter::once("Comments".to_string())
        .chain((1..=MAX_COMMENTS_INDEX).map(|n| format!("Comments{}", n)))
        .find(|name| !message.headers.contains(name));

    match slot {
        Some(name) => {
            debug!("Assigned header: {}", name);
            message.headers.append(name, comment);
        }
        None => warn!("No free Comments header for the posting directive"),
    }

    Some(host)
}

/// Transfer encodings that are decoded before delimiters are removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyEncoding {
    Base64,
    QuotedPrintable,
}

impl BodyEncoding {
    fn of(message: &Message) -> Option<Self> {
        match message.transfer_encoding().as_deref() {
            Some("base64") => Some(Self::Base64),
            Some("quoted-printable") => Some(Self::QuotedPrintable),
            _ => None,
        }
    }

    fn token(self) -> &'static str {
        match self {
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
        }
    }

    fn encode(self, payload: &[u8]) -> String {
        match self {
            Self::Base64 => wrap_base64(&STANDARD.encode(payload)),
            Self::QuotedPrintable => quoted_printable::encode_to_str(payload),
        }
    }
}

/// Decode a single-part body the way a mail reader would
fn decode_body(encoding: BodyEncoding, body: &str) -> Result<Vec<u8>, MailParseError> {
    let part = format!("Content-Transfer-Encoding: {}\r\n\r\n{}", encoding.token(), body);
    let parsed = mailparse::parse_mail(part.as_bytes())?;
    parsed.get_body_raw()
}

/// Each delimiter as configured plus its CRLF form
fn delimiter_forms(delimiters: &[String]) -> Vec<Vec<u8>> {
    let mut forms = Vec::new();
    for delimiter in delimiters.iter().filter(|d| !d.is_empty()) {
        forms.push(delimiter.as_bytes().to_vec());
        if delimiter.contains('\n') && !delimiter.contains("\r\n") {
            forms.push(delimiter.replace('\n', "\r\n").into_bytes());
        }
    }
    forms
}

fn strip_body_delimiters(message: &mut Message, delimiters: &[String]) {
    let forms = delimiter_forms(delimiters);
    if forms.is_empty() {
        return;
    }
    let filter = |payload: &[u8]| {
        forms
            .iter()
            .fold(payload.to_vec(), |body, d| remove_bytes(&body, d))
    };

    let Some(encoding) = BodyEncoding::of(message) else {
        let filtered = filter(message.body.as_bytes());
        if filtered != message.body.as_bytes() {
            // Removing whole UTF-8 sequences leaves valid UTF-8
            message.body = String::from_utf8_lossy(&filtered).into_owned();
            info!("Payload has been modified due to matching remove strings");
        }
        return;
    };

    let decoded = match decode_body(encoding, &message.body) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(
                "Cannot decode {} payload, leaving it unchanged: {}",
                encoding.token(),
                e
            );
            return;
        }
    };

    let filtered = filter(&decoded);
    if filtered != decoded {
        debug!("Re-encoding filtered payload as {}", encoding.token());
        message.body = encoding.encode(&filtered);
        info!("Payload has been modified due to matching remove strings");
    }
}

/// Remove every occurrence of `needle` from `haystack`
fn remove_bytes(haystack: &[u8], needle: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

fn wrap_base64(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LEN + 1);
    for chunk in encoded.as_bytes().chunks(BASE64_LINE_LEN) {
        // base64 output is ASCII
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push('\n');
    }
    out
}
