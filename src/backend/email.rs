//! Pragmatic email check.
//!
//! Not RFC 5322: one or more non-space, non-`@` characters, an `@`, a domain
//! of the same characters containing at least one `.` with text on both sides.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Whether `email` looks like `local@domain.tld`.
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
