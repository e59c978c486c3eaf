//! # Primitives
//!
//! Fixed defaults and input limits for the SASbot core.
//!
//! The limits mirror the dashboard form rules so that data imported through
//! manifests obeys the same bounds as data typed by tenants.

/// Subscription plan assigned to freshly onboarded tenants.
pub const DEFAULT_PLAN: &str = "free";

/// Timezone assigned to new tenants.
pub const DEFAULT_TIMEZONE: &str = "America/Montevideo";

/// Locale assigned to new tenants.
pub const DEFAULT_LOCALE: &str = "es";

/// Currency used when a service does not name one.
pub const DEFAULT_CURRENCY: &str = "UYU";

/// Status of a conversation opened by the message log.
pub const CONVERSATION_ACTIVE: &str = "active";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Company name length bounds (characters) at onboarding.
pub const MIN_COMPANY_NAME: usize = 2;
pub const MAX_COMPANY_NAME: usize = 100;

/// Maximum slug length before the uniqueness suffix is appended.
pub const MAX_SLUG_LENGTH: usize = 50;

/// Service name length bounds (characters).
pub const MIN_SERVICE_NAME: usize = 3;
pub const MAX_SERVICE_NAME: usize = 100;

/// Maximum service description length (characters).
pub const MAX_SERVICE_DESCRIPTION: usize = 500;

/// Bot name length bounds (characters).
pub const MIN_BOT_NAME: usize = 2;
pub const MAX_BOT_NAME: usize = 50;

/// Bot age bounds (inclusive).
pub const MIN_BOT_AGE: u64 = 18;
pub const MAX_BOT_AGE: u64 = 99;

/// Maximum length of a stored config value (JSON text, bytes).
pub const MAX_CONFIG_VALUE_LENGTH: usize = 65536;

/// Maximum length of a config category or key (bytes).
pub const MAX_CONFIG_KEY_LENGTH: usize = 64;

/// Maximum length of a prompt template (bytes).
pub const MAX_TEMPLATE_LENGTH: usize = 32 * 1024;

/// Maximum logged message content length (bytes).
pub const MAX_MESSAGE_LENGTH: usize = 64 * 1024;

/// Maximum contact name length (characters).
pub const MAX_CONTACT_NAME: usize = 100;
