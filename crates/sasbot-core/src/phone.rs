//! # WhatsApp Number Handling
//!
//! The workflow engine forwards numbers exactly as WhatsApp reports them,
//! with or without a leading `+` and sometimes with spaces or dashes.
//! Tenants register numbers through the dashboard in whatever form they
//! typed. Identification therefore normalizes both sides and probes the
//! `+`/no-`+` variants.

use regex::Regex;
use std::sync::LazyLock;

/// E.164: optional `+`, no leading zero, 2 to 15 digits.
static E164: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").ok());

/// Remove whitespace and every character that is not a digit or `+`.
#[must_use]
pub fn normalize_whatsapp_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Index keys to probe for a normalized number, most specific first.
///
/// `"+5491234"` yields `["+5491234", "5491234"]`; `"5491234"` yields
/// `["5491234", "+5491234"]`.
#[must_use]
pub fn lookup_candidates(normalized: &str) -> Vec<String> {
    let digits = normalized.strip_prefix('+').unwrap_or(normalized);
    let mut candidates: Vec<String> = Vec::with_capacity(3);
    for candidate in [
        normalized.to_string(),
        format!("+{}", digits),
        digits.to_string(),
    ] {
        if !candidate.is_empty() && candidate != "+" && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Whether `raw` is a plausible E.164 phone number.
#[must_use]
pub fn is_valid_e164(raw: &str) -> bool {
    E164.as_ref().is_some_and(|re| re.is_match(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_formatting() {
        assert_eq!(normalize_whatsapp_number("+54 9 11 1234-5678"), "+5491112345678");
        assert_eq!(normalize_whatsapp_number(" (598) 99 123 456 "), "59899123456");
        assert_eq!(normalize_whatsapp_number("whatsapp:"), "");
    }

    #[test]
    fn candidates_try_exact_form_first() {
        assert_eq!(lookup_candidates("+598991"), vec!["+598991", "598991"]);
        assert_eq!(lookup_candidates("598991"), vec!["598991", "+598991"]);
    }

    #[test]
    fn candidates_of_empty_number_are_empty() {
        assert!(lookup_candidates("").is_empty());
        assert!(lookup_candidates("+").is_empty());
    }

    #[test]
    fn e164_validation() {
        assert!(is_valid_e164("+59899123456"));
        assert!(is_valid_e164("59899123456"));
        assert!(!is_valid_e164("+0123"));
        assert!(!is_valid_e164("12 34"));
        assert!(!is_valid_e164("+1234567890123456"));
    }
}
