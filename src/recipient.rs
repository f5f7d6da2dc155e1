//! Recipient and destination resolution
//!
//! Mail can name its newsgroups in three ways, strongest first:
//!
//! 1. A `--newsgroups` override from the MTA
//! 2. A Newsgroups header in the message
//! 3. A recipient of the form `mail2news-YYYYMMDD-alt.test=misc.test@gateway`,
//!    where `=` stands for the comma and the date stamp limits replay. Senders
//!    whose software mangles dots write `alt=test` instead; see
//!    [`decode_newsgroups`].
//!
//! The `mail2news_nospam` prefix asks for the sender address to be munged.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::{RunOptions, Thresholds};
use crate::error::RejectReason;
use crate::message::Message;

/// Local-part prefix every gateway recipient starts with
pub const RECIPIENT_PREFIX: &str = "mail2news";

/// Local-part prefix requesting sender anonymization
pub const NOSPAM_PREFIX: &str = "mail2news_nospam";

/// Stand-in recipient when no candidate carries the gateway prefix
pub const UNKNOWN_RECIPIENT: &str = "nobody";

static RECIPIENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(mail2news|mail2news_nospam)-([0-9]{8})-(.*)$")
        .expect("recipient grammar is a valid regex")
});

/// Newsgroups and flags decoded from a gateway recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecipient {
    /// `YYYYMMDD` date stamp
    pub stamp: String,
    /// Comma-separated newsgroups, not yet validated
    pub newsgroups: String,
    /// Sender asked for anonymization
    pub nospam: bool,
}

/// Where a message is going, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Raw comma-separated newsgroups
    pub newsgroups: String,
    /// Munge the From header
    pub anonymize: bool,
}

/// Pick the recipient carrying the gateway prefix
///
/// Candidates are tried in order; the first one starting with
/// [`RECIPIENT_PREFIX`] wins. Without one, [`UNKNOWN_RECIPIENT`] is returned.
///
/// # Examples
///
/// ```
/// use mail2news::recipient::find_recipient;
///
/// let chosen = find_recipient([None, Some("someone@example.com"), Some("mail2news-20230601-alt=test@gw")]);
/// assert_eq!(chosen, "mail2news-20230601-alt=test@gw");
/// assert_eq!(find_recipient([None, Some("someone@example.com")]), "nobody");
/// ```
pub fn find_recipient<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    for candidate in candidates.into_iter().flatten() {
        let candidate = candidate.trim();
        if candidate.starts_with(RECIPIENT_PREFIX) {
            debug!("Selected recipient is {}", candidate);
            return candidate.to_string();
        }
    }
    debug!("Recipient is not {}. Using {}", RECIPIENT_PREFIX, UNKNOWN_RECIPIENT);
    UNKNOWN_RECIPIENT.to_string()
}

/// Decode the newsgroups segment of a recipient
///
/// `=` normally stands for the comma between groups. Every valid newsgroup
/// contains a dot, so a segment with no dot at all can only be using `=` for
/// the dot, and is decoded that way.
///
/// # Examples
///
/// ```
/// use mail2news::recipient::decode_newsgroups;
///
/// assert_eq!(decode_newsgroups("alt.test=local.test"), "alt.test,local.test");
/// assert_eq!(decode_newsgroups("alt=test,local=test"), "alt.test,local.test");
/// ```
pub fn decode_newsgroups(segment: &str) -> String {
    if segment.contains('.') {
        segment.replace('=', ",")
    } else {
        segment.replace('=', ".")
    }
}

/// Decode a `prefix-YYYYMMDD-groups` recipient
///
/// Anything from the last `@` onwards is ignored.
///
/// # Examples
///
/// ```
/// use mail2news::recipient::parse_recipient;
///
/// let decoded = parse_recipient("mail2news_nospam-20230601-alt=test,local=test@gw.example").unwrap();
/// assert_eq!(decoded.stamp, "20230601");
/// assert_eq!(decoded.newsgroups, "alt.test,local.test");
/// assert!(decoded.nospam);
/// ```
pub fn parse_recipient(recipient: &str) -> Result<DecodedRecipient, RejectReason> {
    let user = match recipient.rfind('@') {
        Some(pos) => &recipient[..pos],
        None => recipient,
    };

    let captures = RECIPIENT_RE
        .captures(user)
        .ok_or_else(|| RejectReason::BadRecipient(recipient.to_string()))?;

    info!("Message has a correctly formatted recipient. Validating it");
    let nospam = &captures[1] == NOSPAM_PREFIX;
    if nospam {
        info!("Message includes a nospam directive. Will munge headers accordingly");
    }

    Ok(DecodedRecipient {
        stamp: captures[2].to_string(),
        newsgroups: decode_newsgroups(&captures[3]),
        nospam,
    })
}

/// Check a `YYYYMMDD` stamp is a real date inside the accepted window
///
/// The stamp is taken as midnight UTC and must fall strictly between
/// `now - hours_past` and `now + hours_future`.
pub fn validate_stamp(
    stamp: &str,
    now: DateTime<Utc>,
    hours_past: i64,
    hours_future: i64,
) -> Result<(), RejectReason> {
    let invalid = || RejectReason::StaleOrInvalidTimestamp(stamp.to_string());

    if stamp.len() != 8 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = stamp[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = stamp[4..6].parse().map_err(|_| invalid())?;
    let day: u32 = stamp[6..8].parse().map_err(|_| invalid())?;

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            warn!("Malformed date element {}", stamp);
            invalid()
        })?
        .and_utc();

    let earliest = now - Duration::hours(hours_past);
    let latest = now + Duration::hours(hours_future);

    if earliest < date && date < latest {
        info!("Timestamp ({}) is valid and within bounds", stamp);
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Work out the newsgroups a message is for
///
/// A Newsgroups header is removed from the message; the validated value is
/// added back later.
pub fn resolve_destination(
    message: &mut Message,
    options: &RunOptions,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Result<Destination, RejectReason> {
    let recipient = find_recipient([
        options.recipient.as_deref(),
        message.headers.get("X-Original-To"),
        message.headers.get("To"),
        message.headers.get("Cc"),
    ]);

    if let Some(newsgroups) = &options.newsgroups {
        debug!("Newsgroups passed as argument: {}", newsgroups);
        if message.headers.remove("Newsgroups") > 0 {
            info!("Newsgroups header overridden by --newsgroups argument");
        }
        return Ok(Destination {
            newsgroups: newsgroups.clone(),
            anonymize: false,
        });
    }

    if let Some(newsgroups) = message.headers.get("Newsgroups").map(str::to_string) {
        debug!("Message has a Newsgroups header of {}", newsgroups);
        message.headers.remove("Newsgroups");
        let anonymize = recipient.starts_with(NOSPAM_PREFIX);
        if anonymize {
            info!("Message includes a nospam directive. Will munge headers accordingly");
        }
        return Ok(Destination {
            newsgroups,
            anonymize,
        });
    }

    info!("No Newsgroups header, trying to parse recipient information");
    let decoded = parse_recipient(&recipient)?;
    validate_stamp(
        &decoded.stamp,
        now,
        thresholds.hours_past,
        thresholds.hours_future,
    )?;

    Ok(Destination {
        newsgroups: decoded.newsgroups,
        anonymize: decoded.nospam,
    })
}
