//! Pragmatic email-shape check.
//!
//! This is not RFC 5322 validation: a token passes when it looks like `local@domain.tld` with a
//! top-level label of at least two characters and no whitespace or extra `@` anywhere.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^\s@]+@[^\s@]+\.[^\s@]{2,}$")
        .unwrap_or_else(|err| panic!("email pattern must compile: {err}"))
});

pub fn is_email(token: &str) -> bool {
    EMAIL_SHAPE.is_match(token)
}
