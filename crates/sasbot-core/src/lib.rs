//! # sasbot-core
//!
//! Tenant configuration engine for SASbot, a multi-tenant WhatsApp chatbot
//! service whose conversations run in an external workflow engine.
//!
//! This crate holds everything that is not transport:
//! - domain records and errors (`types`)
//! - WhatsApp number normalization and slugs (`phone`, `slug`)
//! - dashboard-equivalent input validation (`validation`)
//! - system-prompt assembly (`prompt`)
//! - storage behind the `TenantStore` trait (`store`, `storage`)
//! - the operations the HTTP API and CLI expose (`directory`)
//!
//! ## Constraints
//!
//! - No async, no network, no logging dependency
//! - Deterministic ordering (`BTreeMap`, explicit sort keys)
//! - Money as integer minor units, never floating point
//! - Clocks are passed in (`now: DateTime<Utc>`), never read

// =============================================================================
// MODULES
// =============================================================================

pub mod directory;
pub mod manifest;
pub mod phone;
pub mod primitives;
pub mod prompt;
pub mod slug;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    BusinessType, ConfigEntry, Conversation, ConversationId, DefaultConfig, Direction, Image,
    ImageId, IndustryTemplate, Message, MessageId, MessageType, Price, SasbotError, Schedule,
    Service, ServiceId, Tenant, TenantId, TenantStatus, TemplateId,
};

// =============================================================================
// RE-EXPORTS: Directory and Storage
// =============================================================================

pub use directory::{
    Directory, DirectoryStats, ImportSummary, LogMessage, LoggedMessage, OnboardTenant,
    StorageBackend, TenantConfig, TenantIdentity,
};
pub use manifest::Manifest;
pub use storage::RedbStore;
pub use store::{MemoryStore, TenantStore};

// =============================================================================
// RE-EXPORTS: Prompt Assembly
// =============================================================================

pub use prompt::{AssembledPrompt, ConfigMap, PromptInputs, PromptSource, assemble};
