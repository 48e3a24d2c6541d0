//! Validation for the update-peer version string grammar:
//! `(epoch:)? digit [alnum.+-~]* (-[alnum+.~]+)?`

use std::sync::OnceLock;

use regex::Regex;

fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[0-9]+:)?[0-9][A-Za-z0-9.+~-]*(?:-[A-Za-z0-9+.~]+)?$")
            .expect("version grammar regex is valid")
    })
}

/// Returns `true` when `s` matches the version grammar accepted by the
/// update peer's install command.
pub fn is_valid(s: &str) -> bool {
    !s.is_empty() && pattern().is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_versions() {
        assert!(is_valid("1.2.3"));
        assert!(is_valid("2023.08.01"));
    }

    #[test]
    fn accepts_epoch_and_revision() {
        assert!(is_valid("1:1.2.3-4"));
        assert!(is_valid("1:1.2.3~rc1-1"));
    }

    #[test]
    fn rejects_leading_non_digit() {
        assert!(!is_valid("a1.2.3"));
        assert!(!is_valid(""));
    }

    #[test]
    fn rejects_internal_whitespace() {
        assert!(!is_valid("1.2 3"));
    }
}
