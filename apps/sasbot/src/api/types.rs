//! # API Request/Response Types
//!
//! JSON structures of the HTTP API. Field names follow what the workflow
//! engine's nodes already read (`tenant_name`, `n8n_workflow_active`, ...).

use axum::http::StatusCode;
use sasbot_core::{
    DirectoryStats, Image, LogMessage, LoggedMessage, SasbotError, Schedule, Service,
    TenantConfig, TenantIdentity,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Tenant and message counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub backend: String,
    pub tenants: u64,
    pub active: u64,
    pub trial: u64,
    pub suspended: u64,
    pub cancelled: u64,
    pub deleted: u64,
    pub templates: u64,
    pub conversations: u64,
    pub messages: u64,
}

impl StatusResponse {
    pub fn new(backend: &str, stats: DirectoryStats) -> Self {
        Self {
            backend: backend.to_string(),
            tenants: stats.tenants,
            active: stats.active,
            trial: stats.trial,
            suspended: stats.suspended,
            cancelled: stats.cancelled,
            deleted: stats.deleted,
            templates: stats.templates,
            conversations: stats.conversations,
            messages: stats.messages,
        }
    }
}

// =============================================================================
// IDENTIFY TENANT
// =============================================================================

/// `GET /api/n8n/identify-tenant?whatsapp_number=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifyQuery {
    pub whatsapp_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub success: bool,
    pub tenant_id: String,
    pub tenant_name: String,
    pub tenant_slug: String,
    pub business_type: String,
    pub redis_prefix: String,
    pub is_active: bool,
    pub status: String,
    pub subscription_plan: String,
    pub timezone: String,
    pub locale: String,
    pub n8n_workflow_active: bool,
}

impl From<TenantIdentity> for IdentifyResponse {
    fn from(identity: TenantIdentity) -> Self {
        Self {
            success: true,
            tenant_id: identity.tenant_id.to_string(),
            tenant_name: identity.name,
            tenant_slug: identity.slug,
            business_type: identity.business_type.to_string(),
            redis_prefix: identity.redis_prefix,
            is_active: identity.is_active,
            status: identity.status.to_string(),
            subscription_plan: identity.subscription_plan,
            timezone: identity.timezone,
            locale: identity.locale,
            n8n_workflow_active: identity.workflow_active,
        }
    }
}

// =============================================================================
// GET CONFIG
// =============================================================================

/// `GET /api/n8n/get-config?tenant_id=...`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigQuery {
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub business_type: String,
    pub timezone: String,
    pub locale: String,
}

/// A catalog entry. `price` is the exact decimal text (`"1500.50"`);
/// `price_minor` the same amount in cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceJson {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<String>,
    pub price_minor: Option<i64>,
    pub currency: String,
    pub duration_minutes: Option<u32>,
}

impl From<&Service> for ServiceJson {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id.to_string(),
            name: service.name.clone(),
            description: service.description.clone(),
            price: service.price.map(|p| p.to_string()),
            price_minor: service.price.map(|p| p.minor()),
            currency: service.currency.clone(),
            duration_minutes: service.duration_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageJson {
    pub id: String,
    pub url: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
}

impl From<&Image> for ImageJson {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id.to_string(),
            url: image.url.clone(),
            caption: image.caption.clone(),
            alt_text: image.alt_text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleJson {
    pub day_of_week: u8,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_available: bool,
}

impl From<&Schedule> for ScheduleJson {
    fn from(schedule: &Schedule) -> Self {
        Self {
            day_of_week: schedule.day_of_week,
            start_time: schedule.start_time.clone(),
            end_time: schedule.end_time.clone(),
            is_available: schedule.is_available,
        }
    }
}

/// The full bot configuration with the assembled system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub success: bool,
    pub tenant: TenantSummary,
    pub system_prompt: String,
    pub prompt_source: String,
    #[serde(default)]
    pub unresolved_placeholders: Vec<String>,
    pub configs: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    pub services: Vec<ServiceJson>,
    pub services_text: String,
    pub images: Vec<ImageJson>,
    pub availability: Vec<ScheduleJson>,
    pub availability_text: String,
    pub redis_prefix: String,
}

impl From<TenantConfig> for ConfigResponse {
    fn from(config: TenantConfig) -> Self {
        let tenant = &config.tenant;
        Self {
            success: true,
            tenant: TenantSummary {
                id: tenant.id.to_string(),
                name: tenant.name.clone(),
                slug: tenant.slug.clone(),
                business_type: tenant.business_type.to_string(),
                timezone: tenant.timezone.clone(),
                locale: tenant.locale.clone(),
            },
            system_prompt: config.system_prompt,
            prompt_source: config.prompt_source.as_str().to_string(),
            unresolved_placeholders: config.unresolved_placeholders,
            services: config.services.iter().map(ServiceJson::from).collect(),
            services_text: config.services_text,
            images: config.images.iter().map(ImageJson::from).collect(),
            availability: config.availability.iter().map(ScheduleJson::from).collect(),
            availability_text: config.availability_text,
            redis_prefix: config.redis_prefix,
            configs: config.configs.into_inner(),
        }
    }
}

// =============================================================================
// LOG MESSAGE
// =============================================================================

/// `POST /api/n8n/log-message` body. Required fields are optional here so
/// that a missing one yields the API's own 400 instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogMessageRequest {
    pub tenant_id: Option<String>,
    pub phone_number: Option<String>,
    pub contact_name: Option<String>,
    pub message_type: Option<String>,
    pub content: Option<String>,
    pub direction: Option<String>,
    pub whatsapp_message_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl LogMessageRequest {
    pub fn into_log_message(self) -> LogMessage {
        LogMessage {
            tenant_id: self.tenant_id.unwrap_or_default(),
            phone_number: self.phone_number.unwrap_or_default(),
            contact_name: self.contact_name,
            message_type: self.message_type,
            content: self.content,
            direction: self.direction,
            whatsapp_message_id: self.whatsapp_message_id,
            metadata: self.metadata.filter(|m| !m.is_null()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessageResponse {
    pub success: bool,
    pub conversation_id: String,
    pub message_id: String,
    pub conversation_created: bool,
}

impl From<LoggedMessage> for LogMessageResponse {
    fn from(logged: LoggedMessage) -> Self {
        Self {
            success: true,
            conversation_id: logged.conversation_id.to_string(),
            message_id: logged.message_id.to_string(),
            conversation_created: logged.conversation_created,
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Error body shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// HTTP reason phrase, e.g. `"Not Found"`.
    pub error: String,
    pub message: String,
    /// Normalized number that matched no tenant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    /// Status of a tenant that is not serving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: code.canonical_reason().unwrap_or("Error").to_string(),
            message: message.into(),
            whatsapp_number: None,
            status: None,
        }
    }

    /// Map a core error to a status code and body.
    ///
    /// Storage and serialization failures are reported generically; their
    /// details only go to the log.
    pub fn from_error(err: &SasbotError) -> (StatusCode, Self) {
        match err {
            SasbotError::TenantNotFound(_) => {
                (StatusCode::NOT_FOUND, Self::new(StatusCode::NOT_FOUND, "Tenant not found"))
            }
            SasbotError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Self::new(StatusCode::NOT_FOUND, format!("{} not found", what)),
            ),
            SasbotError::TenantInactive(status) => {
                let mut body = Self::new(StatusCode::FORBIDDEN, "Tenant is not active");
                body.status = Some(status.to_string());
                (StatusCode::FORBIDDEN, body)
            }
            SasbotError::InvalidInput { reason, .. } => (
                StatusCode::BAD_REQUEST,
                Self::new(StatusCode::BAD_REQUEST, reason.clone()),
            ),
            SasbotError::SerializationError(_)
            | SasbotError::DeserializationError(_)
            | SasbotError::IoError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred",
                ),
            ),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
