//! # Core Type Definitions
//!
//! This module contains the records stored per tenant:
//! - Identifiers (`TenantId`, `ServiceId`, `ConversationId`, ...)
//! - Tenant account data (`Tenant`, `TenantStatus`, `BusinessType`)
//! - Bot configuration (`ConfigEntry`, `Service`, `Image`, `Schedule`)
//! - Industry templates (`IndustryTemplate`)
//! - Conversation history (`Conversation`, `Message`)
//! - Error types (`SasbotError`)
//!
//! ## Storage Compatibility
//!
//! Every stored record is encoded with postcard. Records therefore avoid
//! serde attributes that need self-describing formats (untagged enums,
//! `skip_serializing_if`, flattened maps). Free-form JSON is carried as
//! text (`value_json`, `metadata_json`) and parsed on demand.

mod price;

pub use price::Price;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh random (v4) identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a tenant (one business, one chatbot).
    TenantId
);
string_id!(
    /// Identifier of a catalog service.
    ServiceId
);
string_id!(
    /// Identifier of a gallery image.
    ImageId
);
string_id!(
    /// Identifier of an industry prompt template.
    TemplateId
);
string_id!(
    /// Identifier of a WhatsApp conversation.
    ConversationId
);
string_id!(
    /// Identifier of a logged message.
    MessageId
);

// =============================================================================
// TENANT
// =============================================================================

/// Lifecycle status of a tenant account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Trial,
    Suspended,
    Cancelled,
}

impl TenantStatus {
    /// Whether the bot should answer for this tenant.
    #[must_use]
    pub const fn is_serving(self) -> bool {
        matches!(self, Self::Active | Self::Trial)
    }

    /// Whether the workflow engine must be refused for this tenant.
    #[must_use]
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::Suspended | Self::Cancelled)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trial => "trial",
            Self::Suspended => "suspended",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantStatus {
    type Err = SasbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "trial" => Ok(Self::Trial),
            "suspended" => Ok(Self::Suspended),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(SasbotError::invalid(
                "status",
                format!("unknown tenant status '{}'", other),
            )),
        }
    }
}

/// Industry a tenant operates in. Selects the industry template on onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessType {
    Escort,
    Dental,
    Retail,
    Restaurant,
    Other,
}

impl BusinessType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Escort => "escort",
            Self::Dental => "dental",
            Self::Retail => "retail",
            Self::Restaurant => "restaurant",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusinessType {
    type Err = SasbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "escort" => Ok(Self::Escort),
            "dental" => Ok(Self::Dental),
            "retail" => Ok(Self::Retail),
            "restaurant" => Ok(Self::Restaurant),
            "other" | "" => Ok(Self::Other),
            other => Err(SasbotError::invalid(
                "business_type",
                format!("unknown business type '{}'", other),
            )),
        }
    }
}

/// A tenant: one business account owning one chatbot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub business_type: BusinessType,
    /// Normalized WhatsApp number (digits, optional leading `+`).
    pub whatsapp_number: Option<String>,
    pub status: TenantStatus,
    pub subscription_plan: String,
    pub timezone: String,
    pub locale: String,
    /// Explicit session-key prefix for the workflow engine's cache.
    pub redis_session_prefix: Option<String>,
    pub industry_template_id: Option<TemplateId>,
    pub workflow_id: Option<String>,
    pub workflow_webhook_url: Option<String>,
    pub workflow_active: bool,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker. Deleted tenants are invisible to the workflow engine.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Tenant {
    /// Create a new trial tenant with default locale settings.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        business_type: BusinessType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TenantId::generate(),
            name: name.into(),
            slug: slug.into(),
            business_type,
            whatsapp_number: None,
            status: TenantStatus::Trial,
            subscription_plan: crate::primitives::DEFAULT_PLAN.to_string(),
            timezone: crate::primitives::DEFAULT_TIMEZONE.to_string(),
            locale: crate::primitives::DEFAULT_LOCALE.to_string(),
            redis_session_prefix: None,
            industry_template_id: None,
            workflow_id: None,
            workflow_webhook_url: None,
            workflow_active: false,
            created_at: now,
            deleted_at: None,
        }
    }

    /// Session-key prefix handed to the workflow engine.
    ///
    /// Falls back to `tenant_<slug>` when no explicit prefix is stored.
    #[must_use]
    pub fn redis_prefix(&self) -> String {
        match self.redis_session_prefix.as_deref().map(str::trim) {
            Some(prefix) if !prefix.is_empty() => prefix.to_string(),
            _ => format!("tenant_{}", self.slug),
        }
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// =============================================================================
// BOT CONFIGURATION
// =============================================================================

/// One key of a tenant's bot configuration, grouped by category
/// (`profile`, `personality`, `rules`, `prompt`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub tenant_id: TenantId,
    pub category: String,
    pub key: String,
    /// The configured value as JSON text.
    pub value_json: String,
    pub display_order: i32,
    pub is_active: bool,
}

impl ConfigEntry {
    /// Build an active entry from a JSON value.
    pub fn new(
        tenant_id: TenantId,
        category: impl Into<String>,
        key: impl Into<String>,
        value: &serde_json::Value,
    ) -> Result<Self, SasbotError> {
        let value_json = serde_json::to_string(value)
            .map_err(|e| SasbotError::SerializationError(e.to_string()))?;
        Ok(Self {
            tenant_id,
            category: category.into(),
            key: key.into(),
            value_json,
            display_order: 0,
            is_active: true,
        })
    }

    /// Parse the stored JSON value.
    pub fn value(&self) -> Result<serde_json::Value, SasbotError> {
        serde_json::from_str(&self.value_json).map_err(|e| {
            SasbotError::DeserializationError(format!(
                "config '{}.{}': {}",
                self.category, self.key, e
            ))
        })
    }
}

/// A service offered by the tenant, with optional pricing and duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub currency: String,
    pub duration_minutes: Option<u32>,
    pub display_order: i32,
    pub is_active: bool,
}

impl Service {
    /// Create an active service with the default currency and no price.
    #[must_use]
    pub fn new(tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id: ServiceId::generate(),
            tenant_id,
            name: name.into(),
            description: None,
            price: None,
            currency: crate::primitives::DEFAULT_CURRENCY.to_string(),
            duration_minutes: None,
            display_order: 0,
            is_active: true,
        }
    }

    #[must_use]
    pub fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An image the bot may send to contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    pub tenant_id: TenantId,
    pub url: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

/// Weekly operating hours for one day.
///
/// `day_of_week` follows the 0 = Sunday .. 6 = Saturday convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub tenant_id: TenantId,
    pub day_of_week: u8,
    /// `HH:MM`, 24-hour clock.
    pub start_time: Option<String>,
    /// `HH:MM`, 24-hour clock.
    pub end_time: Option<String>,
    pub is_available: bool,
}

impl Schedule {
    /// An open day between two `HH:MM` times.
    #[must_use]
    pub fn open(tenant_id: TenantId, day_of_week: u8, start: &str, end: &str) -> Self {
        Self {
            tenant_id,
            day_of_week,
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            is_available: true,
        }
    }

    /// A closed day.
    #[must_use]
    pub fn closed(tenant_id: TenantId, day_of_week: u8) -> Self {
        Self {
            tenant_id,
            day_of_week,
            start_time: None,
            end_time: None,
            is_available: false,
        }
    }
}

// =============================================================================
// INDUSTRY TEMPLATES
// =============================================================================

/// A default configuration seeded into tenants created from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultConfig {
    pub category: String,
    pub key: String,
    pub value_json: String,
}

/// Per-industry starting point: prompt template plus seeded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryTemplate {
    pub id: TemplateId,
    pub name: String,
    pub business_type: BusinessType,
    pub description: Option<String>,
    /// System prompt with `{{ placeholder }}` slots.
    pub system_prompt_template: Option<String>,
    pub default_configurations: Vec<DefaultConfig>,
    pub is_active: bool,
}

// =============================================================================
// CONVERSATIONS
// =============================================================================

/// Direction of a logged message relative to the tenant's bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl FromStr for Direction {
    type Err = SasbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            other => Err(SasbotError::invalid(
                "direction",
                format!("expected inbound or outbound, got '{}'", other),
            )),
        }
    }
}

/// WhatsApp payload kind of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Audio,
    Video,
    Document,
    Location,
}

impl MessageType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Document => "document",
            Self::Location => "location",
        }
    }
}

impl FromStr for MessageType {
    type Err = SasbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            "location" => Ok(Self::Location),
            other => Err(SasbotError::invalid(
                "message_type",
                format!("unsupported message type '{}'", other),
            )),
        }
    }
}

/// A WhatsApp conversation between one contact and one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub tenant_id: TenantId,
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub message_count: u64,
}

/// A single logged message. `sequence` orders messages within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub tenant_id: TenantId,
    pub conversation_id: ConversationId,
    pub sequence: u64,
    pub direction: Direction,
    pub message_type: MessageType,
    pub content: String,
    pub whatsapp_message_id: Option<String>,
    pub metadata_json: Option<String>,
    pub sent_at: DateTime<Utc>,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error types for SASbot operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SasbotError {
    /// No (non-deleted) tenant matches the given id or number.
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    /// The tenant exists but is suspended or cancelled.
    #[error("Tenant is not active: {0}")]
    TenantInactive(TenantStatus),

    /// Some other referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A request or manifest field failed validation.
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// A storage or file I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl SasbotError {
    /// Shorthand for an `InvalidInput` error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn status_serving_and_blocked_are_disjoint() {
        for status in [
            TenantStatus::Active,
            TenantStatus::Trial,
            TenantStatus::Suspended,
            TenantStatus::Cancelled,
        ] {
            assert_ne!(status.is_serving(), status.is_blocked());
        }
    }

    #[test]
    fn status_parses_both_spellings_of_cancelled() {
        assert_eq!("cancelled".parse::<TenantStatus>(), Ok(TenantStatus::Cancelled));
        assert_eq!("Canceled".parse::<TenantStatus>(), Ok(TenantStatus::Cancelled));
        assert!("paused".parse::<TenantStatus>().is_err());
    }

    #[test]
    fn empty_business_type_means_other() {
        assert_eq!("".parse::<BusinessType>(), Ok(BusinessType::Other));
        assert_eq!("Dental".parse::<BusinessType>(), Ok(BusinessType::Dental));
    }

    #[test]
    fn redis_prefix_falls_back_to_slug() {
        let mut tenant = Tenant::new("Clinica Sol", "clinica-sol", BusinessType::Dental, now());
        assert_eq!(tenant.redis_prefix(), "tenant_clinica-sol");

        tenant.redis_session_prefix = Some("   ".to_string());
        assert_eq!(tenant.redis_prefix(), "tenant_clinica-sol");

        tenant.redis_session_prefix = Some("sol:".to_string());
        assert_eq!(tenant.redis_prefix(), "sol:");
    }

    #[test]
    fn config_entry_roundtrips_json_value() {
        let value = serde_json::json!({"bot_name": "Luna", "bot_age": 25});
        let entry = ConfigEntry::new(TenantId::from("t1"), "profile", "profile", &value).unwrap();
        assert_eq!(entry.value().unwrap(), value);
    }

    #[test]
    fn tenant_survives_postcard() {
        let tenant = Tenant::new("Shop", "shop", BusinessType::Retail, now());
        let bytes = postcard::to_allocvec(&tenant).unwrap();
        let decoded: Tenant = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, tenant);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(TenantId::generate(), TenantId::generate());
    }
}
