//! # Input Validation
//!
//! Rules applied before anything reaches the store. They follow the bounds
//! enforced by the tenant dashboard so that manifest imports and API calls
//! cannot produce records the dashboard would refuse.

use crate::primitives::{
    MAX_BOT_AGE, MAX_BOT_NAME, MAX_COMPANY_NAME, MAX_CONFIG_KEY_LENGTH, MAX_CONFIG_VALUE_LENGTH,
    MAX_SERVICE_DESCRIPTION, MAX_SERVICE_NAME, MAX_TEMPLATE_LENGTH, MIN_BOT_AGE, MIN_BOT_NAME,
    MIN_COMPANY_NAME, MIN_SERVICE_NAME,
};
use crate::{ConfigEntry, Image, SasbotError, Schedule, Service};
use regex::Regex;
use std::sync::LazyLock;

/// `H:MM` or `HH:MM`, 00:00 to 23:59.
static CLOCK_TIME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").ok());

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), SasbotError> {
    let len = char_len(value.trim());
    if len < min {
        return Err(SasbotError::invalid(
            field,
            format!("must be at least {} characters", min),
        ));
    }
    if len > max {
        return Err(SasbotError::invalid(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

/// Validate a business name at onboarding.
pub fn validate_company_name(name: &str) -> Result<(), SasbotError> {
    check_length("company_name", name, MIN_COMPANY_NAME, MAX_COMPANY_NAME)
}

/// Validate a catalog service.
pub fn validate_service(service: &Service) -> Result<(), SasbotError> {
    check_length("name", &service.name, MIN_SERVICE_NAME, MAX_SERVICE_NAME)?;
    if let Some(description) = &service.description
        && char_len(description) > MAX_SERVICE_DESCRIPTION
    {
        return Err(SasbotError::invalid(
            "description",
            format!("must be at most {} characters", MAX_SERVICE_DESCRIPTION),
        ));
    }
    if let Some(price) = service.price
        && price.minor() <= 0
    {
        return Err(SasbotError::invalid("price", "must be positive"));
    }
    if service.duration_minutes == Some(0) {
        return Err(SasbotError::invalid("duration_minutes", "must be positive"));
    }
    if service.currency.trim().is_empty() {
        return Err(SasbotError::invalid("currency", "must not be empty"));
    }
    Ok(())
}

/// Validate an image the bot may send. Only the URL is required.
pub fn validate_image(image: &Image) -> Result<(), SasbotError> {
    if image.url.trim().is_empty() {
        return Err(SasbotError::invalid("url", "must not be empty"));
    }
    Ok(())
}

/// Whether `value` is a valid `H:MM`/`HH:MM` clock time.
#[must_use]
pub fn is_clock_time(value: &str) -> bool {
    CLOCK_TIME.as_ref().is_some_and(|re| re.is_match(value))
}

/// Minutes since midnight of a valid clock time.
fn minutes_of(value: &str) -> Option<u32> {
    let (h, m) = value.split_once(':')?;
    Some(h.parse::<u32>().ok()? * 60 + m.parse::<u32>().ok()?)
}

/// Validate one day of operating hours.
pub fn validate_schedule(schedule: &Schedule) -> Result<(), SasbotError> {
    if schedule.day_of_week > 6 {
        return Err(SasbotError::invalid(
            "day_of_week",
            format!("must be 0-6, got {}", schedule.day_of_week),
        ));
    }
    for (field, time) in [
        ("start_time", &schedule.start_time),
        ("end_time", &schedule.end_time),
    ] {
        if let Some(t) = time
            && !is_clock_time(t)
        {
            return Err(SasbotError::invalid(field, format!("expected HH:MM, got '{}'", t)));
        }
    }
    if schedule.is_available {
        match (&schedule.start_time, &schedule.end_time) {
            (Some(start), Some(end)) => {
                if minutes_of(start) >= minutes_of(end) {
                    return Err(SasbotError::invalid(
                        "end_time",
                        format!("{} is not after {}", end, start),
                    ));
                }
            }
            _ => {
                return Err(SasbotError::invalid(
                    "start_time",
                    "available days need both start_time and end_time",
                ));
            }
        }
    }
    Ok(())
}

/// Validate a config entry's shape and the well-known profile fields.
pub fn validate_config(entry: &ConfigEntry) -> Result<(), SasbotError> {
    for (field, value) in [("category", &entry.category), ("key", &entry.key)] {
        if value.trim().is_empty() {
            return Err(SasbotError::invalid(field, "must not be empty"));
        }
        if value.len() > MAX_CONFIG_KEY_LENGTH {
            return Err(SasbotError::invalid(
                field,
                format!("must be at most {} bytes", MAX_CONFIG_KEY_LENGTH),
            ));
        }
    }
    if entry.value_json.len() > MAX_CONFIG_VALUE_LENGTH {
        return Err(SasbotError::invalid(
            "value",
            format!("must be at most {} bytes", MAX_CONFIG_VALUE_LENGTH),
        ));
    }

    let value = entry.value()?;
    if entry.category == "profile" {
        validate_profile_fields(&entry.key, &value)?;
    }
    if entry.category == "prompt"
        && entry.key == "template"
        && value.as_str().is_some_and(|t| t.len() > MAX_TEMPLATE_LENGTH)
    {
        return Err(SasbotError::invalid(
            "template",
            format!("must be at most {} bytes", MAX_TEMPLATE_LENGTH),
        ));
    }
    Ok(())
}

/// Profile values arrive either one key at a time or as one object under
/// the `profile` key; both shapes get the same checks.
fn validate_profile_fields(key: &str, value: &serde_json::Value) -> Result<(), SasbotError> {
    let check = |field: &str, v: &serde_json::Value| -> Result<(), SasbotError> {
        match field {
            "bot_name" => {
                let name = v.as_str().unwrap_or_default();
                check_length("bot_name", name, MIN_BOT_NAME, MAX_BOT_NAME)
            }
            "bot_age" if !v.is_null() => match v.as_u64() {
                Some(age) if (MIN_BOT_AGE..=MAX_BOT_AGE).contains(&age) => Ok(()),
                _ => Err(SasbotError::invalid(
                    "bot_age",
                    format!("must be between {} and {}", MIN_BOT_AGE, MAX_BOT_AGE),
                )),
            },
            _ => Ok(()),
        }
    };

    match value.as_object() {
        Some(fields) if key == "profile" => {
            for (field, v) in fields {
                check(field.as_str(), v)?;
            }
            Ok(())
        }
        _ => check(key, value),
    }
}
