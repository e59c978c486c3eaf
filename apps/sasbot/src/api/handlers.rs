//! # API Endpoint Handlers
//!
//! The three workflow-engine endpoints plus health and status.

use super::{
    AppState,
    types::{
        ConfigQuery, ConfigResponse, ErrorResponse, HealthResponse, IdentifyQuery,
        IdentifyResponse, LogMessageRequest, LogMessageResponse, StatusResponse,
    },
};
use axum::{
    Json,
    extract::{FromRequest, Query, Request, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sasbot_core::{SasbotError, TenantId, phone::normalize_whatsapp_number};

/// Turn a core error into a JSON error response, logging server-side
/// failures with their details.
fn error_response(err: &SasbotError) -> Response {
    let (status, body) = ErrorResponse::from_error(err);
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }
    (status, Json(body)).into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(StatusCode::BAD_REQUEST, message)),
    )
        .into_response()
}

/// `Json` whose rejections (malformed JSON, wrong content type, body too
/// large) use the API's error body instead of axum's plain text.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let status = rejection.status();
                let message = rejection.body_text();
                tracing::debug!(status = %status, error = %message, "Body rejected");
                Err((status, Json(ErrorResponse::new(status, message))).into_response())
            }
        }
    }
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Tenant and message counters.
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let directory = state.directory.read().await;
    let backend = if directory.is_persistent() { "redb" } else { "memory" };
    match directory.stats() {
        Ok(stats) => (StatusCode::OK, Json(StatusResponse::new(backend, stats))).into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// IDENTIFY TENANT
// =============================================================================

/// Resolve the tenant that owns the WhatsApp number a message arrived on.
pub async fn identify_tenant_handler(
    State(state): State<AppState>,
    Query(query): Query<IdentifyQuery>,
) -> Response {
    let Some(raw_number) = query.whatsapp_number.filter(|n| !n.trim().is_empty()) else {
        return bad_request("whatsapp_number is required");
    };

    let directory = state.directory.read().await;
    match directory.identify_tenant(&raw_number) {
        Ok(identity) => {
            tracing::info!(
                event = "tenant_identified",
                tenant_id = %identity.tenant_id,
                status = %identity.status,
            );
            (StatusCode::OK, Json(IdentifyResponse::from(identity))).into_response()
        }
        Err(SasbotError::TenantNotFound(normalized)) => {
            tracing::info!(event = "tenant_not_found", whatsapp_number = %normalized);
            let mut body = ErrorResponse::new(
                StatusCode::NOT_FOUND,
                "No tenant found for this WhatsApp number",
            );
            body.whatsapp_number = Some(normalized);
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
        Err(e) => {
            if let SasbotError::TenantInactive(status) = &e {
                tracing::info!(event = "tenant_inactive", status = %status);
            }
            error_response(&e)
        }
    }
}

// =============================================================================
// GET CONFIG
// =============================================================================

/// Return a tenant's bot configuration with its assembled system prompt.
pub async fn get_config_handler(
    State(state): State<AppState>,
    Query(query): Query<ConfigQuery>,
) -> Response {
    let Some(tenant_id) = query.tenant_id.filter(|id| !id.trim().is_empty()) else {
        return bad_request("tenant_id is required");
    };
    let tenant_id = TenantId::from(tenant_id.trim());

    let directory = state.directory.read().await;
    match directory.tenant_config(&tenant_id) {
        Ok(config) => {
            if !config.unresolved_placeholders.is_empty() {
                tracing::warn!(
                    event = "template_unresolved",
                    tenant_id = %tenant_id,
                    source = config.prompt_source.as_str(),
                    placeholders = ?config.unresolved_placeholders,
                    "Prompt template uses placeholders with no value"
                );
            }
            tracing::debug!(
                tenant_id = %tenant_id,
                source = config.prompt_source.as_str(),
                prompt_bytes = config.system_prompt.len(),
                "Config served"
            );
            (StatusCode::OK, Json(ConfigResponse::from(config))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// LOG MESSAGE
// =============================================================================

/// Record one inbound or outbound WhatsApp message.
pub async fn log_message_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LogMessageRequest>,
) -> Response {
    let missing = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
    if missing(&request.tenant_id) || missing(&request.phone_number) {
        return bad_request("tenant_id and phone_number are required");
    }

    let input = request.into_log_message();
    let contact = normalize_whatsapp_number(&input.phone_number);

    let mut directory = state.directory.write().await;
    match directory.log_message(input, Utc::now()) {
        Ok(logged) => {
            tracing::debug!(
                event = "message_logged",
                conversation_id = %logged.conversation_id,
                sequence = logged.sequence,
                new_conversation = logged.conversation_created,
                contact = %contact,
            );
            (StatusCode::OK, Json(LogMessageResponse::from(logged))).into_response()
        }
        Err(e) => error_response(&e),
    }
}
