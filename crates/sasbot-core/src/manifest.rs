//! # Tenant Manifests
//!
//! Declarative tenant data, usually written as TOML:
//!
//! ```toml
//! [tenant]
//! name = "Clinica Sol"
//! business_type = "dental"
//! whatsapp_number = "+598 99 123 456"
//!
//! [[configs]]
//! category = "profile"
//! key = "bot_name"
//! value = "Luna"
//!
//! [[services]]
//! name = "Limpieza"
//! price = "1500.50"
//! duration_minutes = 45
//!
//! [[schedules]]
//! day_of_week = 1
//! start_time = "09:00"
//! end_time = "18:00"
//! ```
//!
//! These types only describe the document. Turning them into records (and
//! validating them) is done by [`Directory::import`](crate::Directory::import).
//! They are never stored, so unlike the records in [`types`](crate::types)
//! they may use self-describing serde features.

use crate::{Price, SasbotError};
use serde::{Deserialize, Serialize};

/// A whole manifest. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub tenant: Option<TenantManifest>,
    #[serde(default)]
    pub configs: Vec<ConfigManifest>,
    #[serde(default)]
    pub services: Vec<ServiceManifest>,
    #[serde(default)]
    pub schedules: Vec<ScheduleManifest>,
    #[serde(default)]
    pub images: Vec<ImageManifest>,
    #[serde(default)]
    pub templates: Vec<TemplateManifest>,
}

/// `[tenant]`: creates a tenant, or updates the one named by `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantManifest {
    pub id: Option<String>,
    pub name: String,
    pub slug: Option<String>,
    pub business_type: Option<String>,
    pub whatsapp_number: Option<String>,
    pub status: Option<String>,
    pub subscription_plan: Option<String>,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub redis_session_prefix: Option<String>,
    /// Id of an industry template to link (from this manifest or the store).
    pub industry_template: Option<String>,
    pub workflow_id: Option<String>,
    pub workflow_webhook_url: Option<String>,
    pub workflow_active: Option<bool>,
}

/// `[[configs]]`: one configuration key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigManifest {
    pub category: String,
    pub key: String,
    pub value: serde_json::Value,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// A price written either as a whole number or as a decimal string.
///
/// TOML floats are not accepted: `1500.50` must be quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Units(i64),
    Text(String),
}

impl PriceField {
    pub fn to_price(&self) -> Result<Price, SasbotError> {
        match self {
            Self::Units(units) if *units >= 0 => Ok(Price::from_units(*units)),
            Self::Units(units) => Err(SasbotError::invalid(
                "price",
                format!("must not be negative, got {}", units),
            )),
            Self::Text(text) => Price::parse(text),
        }
    }
}

/// `[[services]]`: a catalog entry. Matched to existing services by `id`,
/// then by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceManifest {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<PriceField>,
    pub currency: Option<String>,
    pub duration_minutes: Option<u32>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// `[[schedules]]`: opening hours for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleManifest {
    pub day_of_week: u8,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

/// `[[images]]`: an image the bot may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageManifest {
    pub id: Option<String>,
    pub url: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// `[[templates]]`: an industry template with its seeded defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateManifest {
    pub id: String,
    pub name: String,
    pub business_type: String,
    pub description: Option<String>,
    pub system_prompt_template: Option<String>,
    #[serde(default)]
    pub defaults: Vec<DefaultManifest>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// One seeded `category.key = value` of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultManifest {
    pub category: String,
    pub key: String,
    pub value: serde_json::Value,
}

fn default_true() -> bool {
    true
}

impl Manifest {
    /// Whether the manifest carries per-tenant sections.
    #[must_use]
    pub fn has_tenant_data(&self) -> bool {
        !(self.configs.is_empty()
            && self.services.is_empty()
            && self.schedules.is_empty()
            && self.images.is_empty())
    }
}
