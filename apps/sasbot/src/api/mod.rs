//! # SASbot HTTP API Module
//!
//! The HTTP surface the workflow engine calls, built on axum.
//!
//! ## Endpoints
//!
//! - `GET /api/n8n/identify-tenant?whatsapp_number=` - Tenant behind a WhatsApp number
//! - `GET /api/n8n/get-config?tenant_id=` - Bot configuration and system prompt
//! - `POST /api/n8n/log-message` - Append a message to the conversation log
//! - `GET /status` - Tenant and message counters
//! - `GET /health` - Health check
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `SASBOT_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `SASBOT_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `SASBOT_API_KEY`: If set, requires `x-api-key` or Bearer authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_HEADER, get_api_key_from_env};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ConfigQuery, ConfigResponse, ErrorResponse, HealthResponse, IdentifyQuery, IdentifyResponse,
    ImageJson, LogMessageRequest, LogMessageResponse, ScheduleJson, ServiceJson, StatusResponse,
    TenantSummary,
};

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use sasbot_core::{Directory, SasbotError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this size are refused.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the tenant directory.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<RwLock<Directory>>,
}

impl AppState {
    #[must_use]
    pub fn new(directory: Directory) -> Self {
        Self {
            directory: Arc::new(RwLock::new(directory)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

fn cors_headers() -> [HeaderName; 3] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static(API_KEY_HEADER),
    ]
}

/// Build the CORS layer from `SASBOT_CORS_ORIGINS`:
/// - `*`: any origin
/// - unset: localhost only
/// - otherwise a comma-separated origin list
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("SASBOT_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (SASBOT_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in SASBOT_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers(cors_headers())
            }
        }
        None => {
            tracing::info!("CORS: No SASBOT_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5678",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5678",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers(cors_headers())
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "⚠️  API key authentication DISABLED - all endpoints are publicly accessible! \
             Set SASBOT_API_KEY environment variable to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/api/n8n/identify-tenant",
            get(handlers::identify_tenant_handler),
        )
        .route("/api/n8n/get-config", get(handlers::get_config_handler))
        .route("/api/n8n/log-message", post(handlers::log_message_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the API on `addr` until Ctrl+C.
pub async fn run_server(addr: &str, directory: Directory) -> Result<(), SasbotError> {
    let state = AppState::new(directory);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SasbotError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("SASbot HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SasbotError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

// =============================================================================
// TESTS
// =============================================================================
