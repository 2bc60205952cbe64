//! SQL identifier checks.
//!
//! Table and column names are spliced into commands verbatim; only values
//! go through the escaper. Callers that build schema objects from untrusted
//! input can use these checks to uphold that contract.

use regex::Regex;
use std::sync::OnceLock;

fn plain_identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid"))
}

/// Is `name` a bare identifier that needs no quoting?
///
/// # Examples
///
/// ```
/// use quillite_core::identifiers::is_plain_identifier;
///
/// assert!(is_plain_identifier("users"));
/// assert!(is_plain_identifier("_user_2"));
/// assert!(!is_plain_identifier("2users"));
/// assert!(!is_plain_identifier("users; DROP TABLE users"));
/// ```
pub fn is_plain_identifier(name: &str) -> bool {
    plain_identifier_regex().is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_names() {
        assert!(is_plain_identifier("users"));
        assert!(is_plain_identifier("user_name"));
        assert!(is_plain_identifier("A1"));
        assert!(is_plain_identifier("_"));
    }

    #[test]
    fn rejects_empty() {
        assert!(!is_plain_identifier(""));
    }

    #[test]
    fn rejects_injection_shapes() {
        assert!(!is_plain_identifier("a'b"));
        assert!(!is_plain_identifier("a;b"));
        assert!(!is_plain_identifier("a--"));
        assert!(!is_plain_identifier("first name"));
        assert!(!is_plain_identifier("user\"name"));
    }

    #[test]
    fn rejects_leading_digit_and_unicode() {
        assert!(!is_plain_identifier("1st"));
        assert!(!is_plain_identifier("naïve"));
    }
}
