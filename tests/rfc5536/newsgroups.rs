//! RFC 5536 Section 3.1.4 - Newsgroups
//!
//! The gateway accepts a narrower grammar than the RFC and drops anything
//! outside it before the header is written.

use mail2news::RejectReason;
use mail2news::validation::{is_valid_newsgroup, validate_newsgroups};

#[test]
fn test_newsgroup_names() {
    assert!(is_valid_newsgroup("alt.test"));
    assert!(is_valid_newsgroup("comp.lang.rust"));
    assert!(is_valid_newsgroup("alt.binaries.x_y-z+1"));
    assert!(!is_valid_newsgroup(""));
    assert!(!is_valid_newsgroup("alt."));
    assert!(!is_valid_newsgroup(".alt.test"));
    assert!(!is_valid_newsgroup("alt test"));
}

#[test]
fn test_header_is_comma_joined_without_spaces() {
    let valid = validate_newsgroups("alt.test , misc.test", 3).unwrap();
    assert_eq!(valid.header, "alt.test,misc.test");
}

#[test]
fn test_crosspost_limit() {
    let result = validate_newsgroups("alt.a,alt.b,alt.c,alt.d", 3);
    assert_eq!(
        result.unwrap_err(),
        RejectReason::CrosspostLimitExceeded { count: 4, limit: 3 }
    );
    assert!(validate_newsgroups("alt.a,alt.b,alt.c", 3).is_ok());
}

#[test]
fn test_duplicates_counted_once() {
    let valid = validate_newsgroups("alt.a,alt.a,alt.a,alt.a", 1).unwrap();
    assert_eq!(valid.groups, vec!["alt.a"]);
}
