//! URL-safe tenant slugs.

use crate::primitives::MAX_SLUG_LENGTH;
use chrono::{DateTime, Utc};

/// Lowercase `name`, collapse every run of characters outside `[a-z0-9]`
/// into one `-`, trim dashes at both ends and cap the result at
/// `MAX_SLUG_LENGTH` bytes.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    slug.trim_end_matches('-').to_string()
}

/// Slug with a base-36 millisecond suffix so that two businesses with the
/// same name never collide.
#[must_use]
pub fn unique_slug(name: &str, now: DateTime<Utc>) -> String {
    let base = slugify(name);
    let suffix = to_base36(now.timestamp_millis().unsigned_abs());
    if base.is_empty() {
        format!("tenant-{}", suffix)
    } else {
        format!("{}-{}", base, suffix)
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Clínica Dental  Sol!"), "cl-nica-dental-sol");
        assert_eq!(slugify("--Pizza & Co--"), "pizza-co");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn slugify_caps_length_without_trailing_dash() {
        let long = format!("{} {}", "a".repeat(49), "b".repeat(10));
        let slug = slugify(&long);
        assert_eq!(slug, "a".repeat(49));
        assert!(slug.len() <= MAX_SLUG_LENGTH);
    }

    #[test]
    fn unique_slug_appends_base36_millis() {
        let now = DateTime::from_timestamp_millis(36 * 36).unwrap();
        assert_eq!(unique_slug("Shop", now), "shop-100");
        assert_eq!(unique_slug("!!!", now), "tenant-100");
    }

    #[test]
    fn base36_of_zero() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
    }
}
