//! Hashed Subjects (hSub)
//!
//! An hSub lets readers of a shared mailbox such as alt.anonymous.messages
//! test whether a message is meant for them without the Subject revealing
//! anything. It is the hex encoding of:
//!
//! ```text
//! | 64-bit random IV | SHA1(IV || passphrase) |
//! ```
//!
//! truncated to a configured number of hex characters. The full form is 56
//! characters; the common 48-character form keeps 128 bits of the digest.
//!
//! # Example
//!
//! ```
//! use mail2news::hsub;
//!
//! let subject = hsub::hash("my secret", 48).unwrap();
//! assert_eq!(subject.len(), 48);
//! assert!(hsub::check("my secret", &subject));
//! assert!(!hsub::check("not my secret", &subject));
//! ```

use rand::RngCore;
use sha1::{Digest, Sha1};

/// IV size in bytes
pub const IV_BYTES: usize = 8;
/// IV size in hex characters
pub const IV_HEX_LEN: usize = IV_BYTES * 2;
/// Shortest supported hSub: the IV plus 64 bits of digest
pub const MIN_LENGTH: usize = IV_HEX_LEN + 16;
/// Longest supported hSub: the IV plus the whole 160-bit digest
pub const MAX_LENGTH: usize = IV_HEX_LEN + 40;
/// Length used when none is configured
pub const DEFAULT_LENGTH: usize = 48;

/// Whether `length` hex characters is a valid hSub size
pub fn is_supported_length(length: usize) -> bool {
    (MIN_LENGTH..=MAX_LENGTH).contains(&length) && length % 2 == 0
}

/// Create an hSub for `text` using a fresh random IV
///
/// Returns `None` if `length` is not supported.
pub fn hash(text: &str, length: usize) -> Option<String> {
    let mut iv = [0u8; IV_BYTES];
    rand::thread_rng().fill_bytes(&mut iv);
    hash_with_iv(text, &iv, length)
}

/// Create an hSub for `text` using a known IV
///
/// Returns `None` if `length` is not supported.
pub fn hash_with_iv(text: &str, iv: &[u8; IV_BYTES], length: usize) -> Option<String> {
    if !is_supported_length(length) {
        return None;
    }

    let mut hasher = Sha1::new();
    hasher.update(iv);
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();

    let mut raw = Vec::with_capacity(IV_BYTES + digest.len());
    raw.extend_from_slice(iv);
    raw.extend_from_slice(&digest);

    let mut encoded = hex::encode(raw);
    encoded.truncate(length);
    Some(encoded)
}

/// Check whether `hsub` was produced from `text`
///
/// The IV is taken from the first 16 hex characters and the hash recomputed
/// at the same length. Anything that is not a supported-length hex string
/// simply fails to match.
pub fn check(text: &str, hsub: &str) -> bool {
    if !hsub.is_ascii() || !is_supported_length(hsub.len()) {
        return false;
    }

    let mut iv = [0u8; IV_BYTES];
    if hex::decode_to_slice(&hsub[..IV_HEX_LEN], &mut iv).is_err() {
        return false;
    }

    match hash_with_iv(text, &iv, hsub.len()) {
        Some(expected) => expected.eq_ignore_ascii_case(hsub),
        None => false,
    }
}
