//! Message-ID and newsgroup validation
//!
//! The gateway is stricter about newsgroup names than RFC 5536: a hierarchy
//! of 1-9 lowercase letters followed by at least one further component.
//! Feeding junk to upstream servers is pointless, so bad names are dropped
//! here rather than left for the peers to refuse.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::error::RejectReason;
use crate::{NntpError, Result};

static NEWSGROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{1,9}(\.[0-9a-z\-+_]+)+$").expect("newsgroup grammar is a valid regex")
});

/// Validates a Message-ID header value
///
/// Message-IDs must have the format `<local-part@domain>` with no whitespace
/// or control characters. IHAVE offers articles by this value, so a peer
/// will refuse anything malformed.
///
/// # Examples
///
/// ```
/// use mail2news::validation::validate_message_id;
///
/// assert!(validate_message_id("<abc123@example.com>").is_ok());
/// assert!(validate_message_id("abc123@example.com").is_err()); // Missing brackets
/// assert!(validate_message_id("<abc123>").is_err());           // Missing @
/// ```
pub fn validate_message_id(message_id: &str) -> Result<()> {
    let content = message_id
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .ok_or_else(|| {
            NntpError::InvalidResponse(
                "Message-ID must be enclosed in angle brackets: <local-part@domain>".to_string(),
            )
        })?;

    if content.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err(NntpError::InvalidResponse(
            "Message-ID cannot contain whitespace or control characters".to_string(),
        ));
    }

    match content.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(NntpError::InvalidResponse(format!(
            "Message-ID must be <local-part@domain> with exactly one @: {}",
            message_id
        ))),
    }
}

/// Whether `name` is an acceptable newsgroup name
///
/// # Examples
///
/// ```
/// use mail2news::validation::is_valid_newsgroup;
///
/// assert!(is_valid_newsgroup("alt.anonymous.messages"));
/// assert!(is_valid_newsgroup("de.comp.lang.c++"));
/// assert!(!is_valid_newsgroup("test"));              // Single component
/// assert!(!is_valid_newsgroup("Alt.test"));          // Uppercase
/// assert!(!is_valid_newsgroup("verylonghier.test")); // Hierarchy over 9 letters
/// ```
pub fn is_valid_newsgroup(name: &str) -> bool {
    NEWSGROUP_RE.is_match(name)
}

/// The cleaned-up distribution of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedGroups {
    /// Newsgroups in their original order, first occurrence kept
    pub groups: Vec<String>,
    /// Comma-joined value for the Newsgroups header
    pub header: String,
}

/// Weed out bad and duplicate entries from a Newsgroups value
///
/// Invalid names are dropped with a log line rather than rejecting the whole
/// message. The message is rejected only when nothing valid remains or the
/// distribution is wider than `max_crossposts`.
///
/// # Examples
///
/// ```
/// use mail2news::validation::validate_newsgroups;
///
/// let valid = validate_newsgroups("alt.test, bad!!, alt.test,", 3).unwrap();
/// assert_eq!(valid.groups, vec!["alt.test"]);
/// assert_eq!(valid.header, "alt.test");
/// ```
pub fn validate_newsgroups(
    newsgroups: &str,
    max_crossposts: usize,
) -> std::result::Result<ValidatedGroups, RejectReason> {
    let mut groups: Vec<String> = Vec::new();

    for group in newsgroups.trim_end_matches(',').split(',').map(str::trim) {
        if !is_valid_newsgroup(group) {
            info!("{} is not a validated newsgroup, ignoring", group);
        } else if groups.iter().any(|g| g == group) {
            info!("Duplicate newsgroup entry of {}. Dropping one", group);
        } else {
            groups.push(group.to_string());
        }
    }

    if groups.is_empty() {
        return Err(RejectReason::NoValidNewsgroups);
    }

    let header = groups.join(",");
    info!("Validated Newsgroups header is: {}", header);

    if groups.len() > max_crossposts {
        return Err(RejectReason::CrosspostLimitExceeded {
            count: groups.len(),
            limit: max_crossposts,
        });
    }

    Ok(ValidatedGroups { groups, header })
}
