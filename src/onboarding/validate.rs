//! Input validation for collected lead details.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").unwrap());

/// E.164-ish: leading +, non-zero first digit, 8 to 15 digits total.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+[1-9]\d{7,14}$").unwrap());

/// Loose shape check, not deliverability. Anything with a local part, a
/// domain, and a 2+ character TLD passes.
pub fn is_valid_email(input: &str) -> bool {
    EMAIL_RE.is_match(input.trim())
}

/// Strip the formatting the flow tolerates: surrounding whitespace,
/// internal spaces, and hyphens. Anything else stays and fails validation.
pub fn normalize_phone(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Validate an already-normalized phone number.
pub fn is_valid_phone(normalized: &str) -> bool {
    PHONE_RE.is_match(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_emails() {
        for email in ["a@b.co", "first.last@example.com", "x+tag@sub.domain.io"] {
            assert!(is_valid_email(email), "{email}");
        }
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["", "plain", "a@b", "a@b.c", "two words@x.com", "a@@b.com"] {
            assert!(!is_valid_email(email), "{email}");
        }
    }

    #[test]
    fn email_check_trims_surrounding_whitespace() {
        assert!(is_valid_email("  a@b.co  "));
    }

    #[test]
    fn normalize_strips_typed_formatting() {
        assert_eq!(normalize_phone(" +44 7700 900-000 "), "+447700900000");
        assert_eq!(normalize_phone("+1 415 555-2671"), "+14155552671");
    }

    #[test]
    fn parenthesized_numbers_stay_invalid() {
        // Only spaces and hyphens are stripped; other formatting is kept
        // and fails the digit check.
        let normalized = normalize_phone("+1 (415) 555-2671");
        assert_eq!(normalized, "+1(415)5552671");
        assert!(!is_valid_phone(&normalized));
    }

    #[test]
    fn accepts_international_numbers() {
        for phone in ["+447700900000", "+14155552671", "+861234567890"] {
            assert!(is_valid_phone(phone), "{phone}");
        }
    }

    #[test]
    fn rejects_bad_numbers() {
        for phone in ["447700900000", "+0123456789", "+1234567", "+1234567890123456", "+44abc"] {
            assert!(!is_valid_phone(phone), "{phone}");
        }
    }
}
