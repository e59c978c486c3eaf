//! # Property-Based Tests
//!
//! Invariants of number normalization, slugs, prices and template
//! rendering, checked with proptest.

use chrono::{DateTime, Utc};
use proptest::collection::vec;
use proptest::prelude::*;
use sasbot_core::phone::{lookup_candidates, normalize_whatsapp_number};
use sasbot_core::primitives::MAX_SLUG_LENGTH;
use sasbot_core::prompt::template::{placeholders, render};
use sasbot_core::slug::slugify;
use sasbot_core::{Directory, OnboardTenant, Price};

fn digits_of(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp")
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Normalizing twice changes nothing.
    #[test]
    fn normalization_is_idempotent(raw in ".{0,40}") {
        let once = normalize_whatsapp_number(&raw);
        prop_assert_eq!(normalize_whatsapp_number(&once), once.clone());
        prop_assert!(once.chars().all(|c| c.is_ascii_digit() || c == '+'));
    }

    /// Every lookup candidate carries the same digits as the input and the
    /// exact input is probed first.
    #[test]
    fn candidates_keep_digits(digits in "[0-9]{1,15}", plus in any::<bool>()) {
        let normalized = if plus { format!("+{}", digits) } else { digits.clone() };
        let candidates = lookup_candidates(&normalized);

        prop_assert_eq!(candidates.first(), Some(&normalized));
        prop_assert_eq!(candidates.len(), 2);
        for candidate in &candidates {
            prop_assert_eq!(digits_of(candidate), digits.clone());
        }
    }

    /// Slugs only use `[a-z0-9-]`, never start or end with a dash, never
    /// repeat one and respect the length cap.
    #[test]
    fn slugs_are_url_safe(name in "\\PC{0,120}") {
        let slug = slugify(&name);
        prop_assert!(slug.len() <= MAX_SLUG_LENGTH);
        prop_assert!(slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
        prop_assert_eq!(slugify(&slug), slug.clone());
    }

    /// A displayed price parses back to the same amount.
    #[test]
    fn price_display_parses_back(minor in 0i64..1_000_000_000_000) {
        let price = Price::from_minor(minor);
        prop_assert_eq!(Price::parse(&price.to_string()).expect("parse"), price);
    }

    /// Text without `{{` renders unchanged and reports nothing.
    #[test]
    fn plain_text_renders_unchanged(text in "[^{]{0,200}") {
        let rendered = render(&text, |_| None);
        prop_assert_eq!(rendered.text, text);
        prop_assert!(rendered.unresolved.is_empty());
    }

    /// With a resolver that knows every name, nothing is unresolved and the
    /// output contains no placeholders.
    #[test]
    fn known_placeholders_all_resolve(names in vec("[a-z_]{1,12}", 1..8), filler in "[a-z ]{0,10}") {
        let template: String = names
            .iter()
            .map(|n| format!("{}{{{{ {} }}}}", filler, n))
            .collect();
        let rendered = render(&template, |name| Some(name.to_uppercase()));
        prop_assert!(rendered.unresolved.is_empty());
        prop_assert!(!rendered.text.contains("{{"));

        let found = placeholders(&template);
        for name in &names {
            prop_assert!(found.contains(name));
        }
    }

    /// Unknown placeholders are reported once each, in first-seen order.
    #[test]
    fn unresolved_names_are_unique(names in vec("[a-z]{1,6}", 1..10)) {
        let template: String = names.iter().map(|n| format!("{{{{{}}}}}", n)).collect();
        let rendered = render(&template, |_| None);

        let mut expected: Vec<String> = Vec::new();
        for name in &names {
            if !expected.contains(name) {
                expected.push(name.clone());
            }
        }
        prop_assert_eq!(rendered.text, "");
        prop_assert_eq!(rendered.unresolved, expected);
    }

    /// A registered number is found whether or not the caller sends the `+`.
    #[test]
    fn registered_numbers_identify_in_both_forms(digits in "[1-9][0-9]{7,13}") {
        let mut dir = Directory::new();
        let tenant = dir
            .onboard(
                OnboardTenant {
                    company_name: "Clinica Sol".to_string(),
                    ..OnboardTenant::default()
                },
                now(),
            )
            .expect("onboard");
        dir.set_whatsapp_number(&tenant.id, &format!("+{}", digits))
            .expect("set number");

        for form in [format!("+{}", digits), digits.clone()] {
            let identity = dir.identify_tenant(&form).expect("identify");
            prop_assert_eq!(identity.tenant_id, tenant.id.clone());
        }
    }
}
