//! Plain-text renderings of the catalog and opening hours.
//!
//! The workflow engine receives these alongside the structured data so that
//! chat nodes can paste them into replies verbatim.

use super::labels::Labels;
use crate::{Schedule, Service};

/// One line per schedule: `Lunes: 09:00 - 18:00` or `Domingo: No disponible`.
#[must_use]
pub fn availability_text(schedules: &[Schedule], labels: &Labels) -> String {
    if schedules.is_empty() {
        return labels.no_schedules.to_string();
    }

    schedules
        .iter()
        .map(|s| {
            let day = match labels.days.get(s.day_of_week as usize) {
                Some(name) => (*name).to_string(),
                None => format!("{} {}", labels.day_fallback, s.day_of_week),
            };
            if s.is_available {
                format!(
                    "{}: {} - {}",
                    day,
                    s.start_time.as_deref().unwrap_or_default(),
                    s.end_time.as_deref().unwrap_or_default()
                )
            } else {
                format!("{}: {}", day, labels.unavailable)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bulleted catalog: `• Name - 1500 UYU (60 min)` plus an indented
/// description line when one is set.
#[must_use]
pub fn services_text(services: &[Service], labels: &Labels) -> String {
    if services.is_empty() {
        return labels.no_services.to_string();
    }

    services
        .iter()
        .map(|s| {
            let mut text = format!("• {}", s.name);
            if let Some(price) = s.price.filter(|p| !p.is_zero()) {
                text.push_str(&format!(" - {} {}", price, s.currency));
            }
            if let Some(minutes) = s.duration_minutes.filter(|m| *m > 0) {
                text.push_str(&format!(" ({} {})", minutes, labels.minutes));
            }
            if let Some(description) = s.description.as_deref().filter(|d| !d.trim().is_empty()) {
                text.push_str(&format!("\n  {}", description));
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Catalog lines for the default prompt: `- Name: 1500 UYU (60 min)`.
#[must_use]
pub fn services_prompt_lines(services: &[Service], labels: &Labels) -> String {
    let mut out = String::new();
    for s in services {
        out.push_str(&format!("- {}", s.name));
        if let Some(price) = s.price.filter(|p| !p.is_zero()) {
            out.push_str(&format!(": {} {}", price, s.currency));
        }
        if let Some(minutes) = s.duration_minutes.filter(|m| *m > 0) {
            out.push_str(&format!(" ({} {})", minutes, labels.minutes));
        }
        out.push('\n');
        if let Some(description) = s.description.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str(&format!("  {}\n", description));
        }
    }
    out
}
