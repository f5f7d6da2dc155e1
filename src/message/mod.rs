//! Email message representation
//!
//! This module is organized into:
//! - `types`: Ordered header list and the Message itself
//! - `parsing`: Raw text to Message
//! - `normalize`: Parsing plus Message-ID assurance

mod normalize;
mod parsing;
mod types;

pub use self::normalize::{generate_message_id, normalize};
pub use self::parsing::{parse_headers, parse_message, split_message, unfold_header};
pub use self::types::{Headers, Message};
