//! RFC 5536 - Netnews Article Format
//!
//! Header rules the gateway enforces on articles it injects.
//! https://datatracker.ietf.org/doc/html/rfc5536

mod rfc5536 {
    mod headers;
    mod message_id;
    mod newsgroups;
}
