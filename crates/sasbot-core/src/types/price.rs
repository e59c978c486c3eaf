//! Integer money amounts.

use super::SasbotError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A price in minor currency units (cents). Catalog validation only
/// accepts positive amounts.
///
/// Parsing and display are exact: `"1500.5"` is stored as `150050` and
/// printed back as `1500.50`; whole amounts print without decimals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Price(i64);

impl Price {
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Price from whole currency units.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(100))
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parse a decimal amount with at most two fractional digits.
    pub fn parse(input: &str) -> Result<Self, SasbotError> {
        let text = input.trim();
        let invalid = |reason: &str| SasbotError::invalid("price", format!("{reason}: '{input}'"));

        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected a non-negative decimal amount"));
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("at most two decimal places are allowed"));
        }
        if text.ends_with('.') {
            return Err(invalid("missing decimal digits"));
        }

        let units: i64 = whole.parse().map_err(|_| invalid("amount too large"))?;
        let cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("bad decimals"))? * 10,
            _ => frac.parse::<i64>().map_err(|_| invalid("bad decimals"))?,
        };

        units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Self)
            .ok_or_else(|| invalid("amount too large"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let (units, cents) = (abs / 100, abs % 100);
        if cents == 0 {
            write!(f, "{}{}", sign, units)
        } else {
            write!(f, "{}{}.{:02}", sign, units, cents)
        }
    }
}
