//! Turning raw input into a message the gateway can work on

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::{info, warn};

use super::parsing::parse_message;
use super::types::Message;
use crate::validation::validate_message_id;

/// Number of random characters in a synthesized Message-ID
const MESSAGE_ID_RANDOM_CHARS: usize = 12;

/// Build a Message-ID of the form `<YYYYMMDDHHMMSS.random@domain>`
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use mail2news::message::generate_message_id;
///
/// let now = Utc.with_ymd_and_hms(2023, 6, 1, 12, 30, 0).unwrap();
/// let mid = generate_message_id("mail2news.example.net", now);
/// assert!(mid.starts_with("<20230601123000."));
/// assert!(mid.ends_with("@mail2news.example.net>"));
/// ```
pub fn generate_message_id(domain: &str, now: DateTime<Utc>) -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(MESSAGE_ID_RANDOM_CHARS)
        .map(char::from)
        .collect();
    format!("<{}.{}@{}>", now.format("%Y%m%d%H%M%S"), random, domain)
}

/// Parse raw input and make sure it carries a Message-ID
///
/// A message reaching the gateway through an MTA always has a Message-ID,
/// so a missing one is logged as an anomaly before one is assigned.
pub fn normalize(raw: &str, domain: &str, now: DateTime<Utc>) -> Message {
    let mut message = parse_message(raw);

    match message.message_id() {
        Some(mid) => {
            info!("Processing message {}", mid);
            if let Err(e) = validate_message_id(mid) {
                warn!("Message-ID {} is malformed: {}", mid, e);
            }
        }
        None => {
            let mid = generate_message_id(domain, now);
            warn!("Processing message with no Message-ID. Assigning {}", mid);
            message.headers.append("Message-ID", mid);
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_generated_id_is_valid() {
        let mid = generate_message_id("gate.example.org", now());
        assert!(validate_message_id(&mid).is_ok());
        let local = &mid[1..mid.find('@').unwrap()];
        let (stamp, random) = local.split_once('.').unwrap();
        assert_eq!(stamp, "20230601080000");
        assert_eq!(random.len(), MESSAGE_ID_RANDOM_CHARS);
        assert!(random.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(
            generate_message_id("a.example", now()),
            generate_message_id("a.example", now())
        );
    }

    #[test]
    fn test_normalize_keeps_existing_id() {
        let message = normalize("Message-ID: <abc@example.com>\n\nbody\n", "gate.example", now());
        assert_eq!(message.message_id(), Some("<abc@example.com>"));
        assert_eq!(message.headers.get_all("message-id").count(), 1);
    }

    #[test]
    fn test_normalize_assigns_missing_id() {
        let message = normalize("Subject: s\n\nbody\n", "gate.example", now());
        let mid = message.message_id().unwrap();
        assert!(mid.starts_with("<20230601080000."));
        assert!(mid.ends_with("@gate.example>"));
    }
}
