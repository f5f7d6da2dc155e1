//! Abuse policy checks
//!
//! Checks run in a fixed order and the first hit rejects the message:
//!
//! 1. Poison header present
//! 2. Relay HELO contains a poison string
//! 3. From contains a poison string
//! 4. Newsgroups contains a poison string
//! 5. Optional moderation check on the final distribution
//!
//! String lists match by substring containment anywhere in the field,
//! including at the very start. Empty list entries never match.

use tracing::warn;

use crate::config::FilterConfig;
use crate::error::RejectReason;
use crate::message::Message;

/// A pluggable check on the final distribution
///
/// Implemented by [`crate::moderated::ModeratedGroups`]; any other source of
/// moderation data can take its place.
pub trait ModerationCheck {
    /// First moderated group in `groups`, if any
    fn first_moderated<'a>(&self, groups: &'a [String]) -> Option<&'a str>;
}

/// First entry of `list` found inside `item`
///
/// # Examples
///
/// ```
/// use mail2news::policy::blacklisted;
///
/// let list = vec!["spam".to_string(), "evil.example".to_string()];
/// assert_eq!(blacklisted("evil.example <x@y>", &list), Some("evil.example"));
/// assert_eq!(blacklisted("good@example.org", &list), None);
/// ```
pub fn blacklisted<'a>(item: &str, list: &'a [String]) -> Option<&'a str> {
    list.iter()
        .map(String::as_str)
        .find(|entry| !entry.is_empty() && item.contains(entry))
}

/// Run the policy checks against a message whose destination is known
///
/// `newsgroups` is the validated Newsgroups value; `groups` is the same
/// distribution as a list for the moderation check.
pub fn check_policy(
    message: &Message,
    helo: Option<&str>,
    newsgroups: &str,
    groups: &[String],
    filters: &FilterConfig,
    moderation: Option<&dyn ModerationCheck>,
) -> Result<(), RejectReason> {
    if let Some(header) = filters
        .poison_headers
        .iter()
        .find(|name| message.headers.contains(name))
    {
        warn!("Message contains a blacklisted {} header. Rejecting it", header);
        return Err(RejectReason::PoisonHeader(header.clone()));
    }

    if let Some(helo) = helo {
        if let Some(hit) = blacklisted(helo, &filters.poison_helo) {
            warn!("Message received from blacklisted relay {}. Rejecting it", helo);
            return Err(RejectReason::PoisonHelo(hit.to_string()));
        }
    }

    if let Some(from) = message.headers.get("From") {
        if let Some(hit) = blacklisted(from, &filters.poison_from) {
            warn!("Rejecting due to blacklisted From '{}'", hit);
            return Err(RejectReason::PoisonFrom(hit.to_string()));
        }
    }

    if let Some(hit) = blacklisted(newsgroups, &filters.poison_newsgroups) {
        warn!("Rejecting due to blacklisted newsgroup '{}' in distribution", hit);
        return Err(RejectReason::PoisonNewsgroup(hit.to_string()));
    }

    if let Some(check) = moderation {
        if let Some(group) = check.first_moderated(groups) {
            warn!("Distribution includes moderated group {}. Rejecting it", group);
            return Err(RejectReason::ModeratedGroup(group.to_string()));
        }
    }

    Ok(())
}
