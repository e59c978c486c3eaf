//! # CLI Command Implementations

use crate::api;
use chrono::Utc;
use sasbot_core::{Directory, Manifest, OnboardTenant, SasbotError, TenantId};
use std::path::{Path, PathBuf};

/// Manifests are hand-written documents; anything larger is a mistake.
const MAX_MANIFEST_FILE_SIZE: u64 = 10 * 1024 * 1024;

// =============================================================================
// FILE HELPERS
// =============================================================================

/// Resolve `path` (symlinks, `..`) and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, SasbotError> {
    let canonical = path.canonicalize().map_err(|e| {
        SasbotError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(SasbotError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SasbotError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SasbotError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SasbotError::invalid(
            "manifest",
            format!(
                "file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                max_size
            ),
        ));
    }
    Ok(())
}

/// Read and parse a TOML manifest.
pub fn load_manifest(path: &Path) -> Result<Manifest, SasbotError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_MANIFEST_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated)
        .map_err(|e| SasbotError::IoError(format!("Read file: {}", e)))?;
    parse_manifest(&text)
}

/// Parse manifest text.
pub fn parse_manifest(text: &str) -> Result<Manifest, SasbotError> {
    toml::from_str(text).map_err(|e| SasbotError::invalid("manifest", e.to_string()))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

pub async fn cmd_server(
    db_path: &Path,
    backend: &str,
    host: &str,
    port: u16,
    manifest: Option<&Path>,
) -> Result<(), SasbotError> {
    let mut directory = open_directory(db_path, backend)?;

    if let Some(path) = manifest {
        let summary = directory.import(load_manifest(path)?, Utc::now())?;
        tracing::info!(
            event = "manifest_applied",
            path = %path.display(),
            tenant_id = ?summary.tenant_id,
            services = summary.services,
            templates = summary.templates,
        );
    }

    println!("SASbot Tenant Configuration Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", backend);
    println!("  Database: {:?}", db_path);
    println!();
    println!("Endpoints:");
    println!("  GET  /api/n8n/identify-tenant - Tenant for a WhatsApp number");
    println!("  GET  /api/n8n/get-config      - Bot configuration and system prompt");
    println!("  POST /api/n8n/log-message     - Log a conversation message");
    println!("  GET  /status                  - Tenant counters");
    println!("  GET  /health                  - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, directory).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

pub fn cmd_status(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), SasbotError> {
    let directory = open_directory(db_path, backend)?;
    let stats = directory.stats()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "stats": stats,
        }));
        return Ok(());
    }

    println!("SASbot Status");
    println!("=============");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    println!("Tenants:       {}", stats.tenants);
    println!("  Active:      {}", stats.active);
    println!("  Trial:       {}", stats.trial);
    println!("  Suspended:   {}", stats.suspended);
    println!("  Cancelled:   {}", stats.cancelled);
    println!("  Deleted:     {}", stats.deleted);
    println!("Templates:     {}", stats.templates);
    println!("Conversations: {}", stats.conversations);
    println!("Messages:      {}", stats.messages);

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

pub fn cmd_init(db_path: &Path, backend: &str, force: bool) -> Result<(), SasbotError> {
    if backend != "redb" {
        return Err(SasbotError::invalid(
            "backend",
            "init only applies to the redb backend",
        ));
    }
    if db_path.exists() {
        if !force {
            return Err(SasbotError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| SasbotError::IoError(format!("Remove database: {}", e)))?;
    }

    Directory::with_redb(db_path)?;
    println!("Initialized new redb database at {:?}", db_path);
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

pub fn cmd_import(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    file: &Path,
) -> Result<(), SasbotError> {
    let manifest = load_manifest(file)?;
    let mut directory = open_directory(db_path, backend)?;

    tracing::info!("Importing manifest {:?}", file);
    let summary = directory.import(manifest, Utc::now())?;

    if json_mode {
        print_json(&serde_json::json!({ "success": true, "summary": summary }));
        return Ok(());
    }

    match &summary.tenant_id {
        Some(id) if summary.tenant_created => println!("Created tenant {}", id),
        Some(id) => println!("Updated tenant {}", id),
        None => println!("No tenant section"),
    }
    println!("  Templates: {}", summary.templates);
    println!("  Configs:   {}", summary.configs);
    println!("  Services:  {}", summary.services);
    println!("  Schedules: {}", summary.schedules);
    println!("  Images:    {}", summary.images);

    Ok(())
}

// =============================================================================
// ONBOARD COMMAND
// =============================================================================

pub fn cmd_onboard(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    name: String,
    business_type: Option<String>,
    template: Option<String>,
) -> Result<(), SasbotError> {
    let mut directory = open_directory(db_path, backend)?;
    let tenant = directory.onboard(
        OnboardTenant {
            company_name: name,
            business_type,
            template_id: template,
        },
        Utc::now(),
    )?;

    if json_mode {
        print_json(&serde_json::json!({ "success": true, "tenant": tenant }));
        return Ok(());
    }

    println!("Onboarded {} ({})", tenant.name, tenant.business_type);
    println!("  Id:       {}", tenant.id);
    println!("  Slug:     {}", tenant.slug);
    println!("  Status:   {}", tenant.status);
    if let Some(template) = &tenant.industry_template_id {
        println!("  Template: {}", template);
    }
    Ok(())
}

// =============================================================================
// TENANTS COMMAND
// =============================================================================

pub fn cmd_tenants(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), SasbotError> {
    let directory = open_directory(db_path, backend)?;
    let tenants = directory.tenants()?;

    if json_mode {
        print_json(&serde_json::json!({ "tenants": tenants }));
        return Ok(());
    }

    if tenants.is_empty() {
        println!("No tenants");
        return Ok(());
    }
    for tenant in &tenants {
        println!(
            "{}  {:<10} {:<24} {}",
            tenant.id,
            tenant.status.as_str(),
            tenant.slug,
            tenant.whatsapp_number.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

// =============================================================================
// IDENTIFY COMMAND
// =============================================================================

pub fn cmd_identify(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    number: &str,
) -> Result<(), SasbotError> {
    let directory = open_directory(db_path, backend)?;
    let identity = directory.identify_tenant(number)?;

    if json_mode {
        print_json(&serde_json::json!(api::IdentifyResponse::from(identity)));
        return Ok(());
    }

    println!("{} -> {} ({})", number, identity.name, identity.tenant_id);
    println!("  Status:       {}", identity.status);
    println!("  Redis prefix: {}", identity.redis_prefix);
    println!("  Workflow:     {}", if identity.workflow_active { "active" } else { "inactive" });
    Ok(())
}

// =============================================================================
// PROMPT COMMAND
// =============================================================================

pub fn cmd_prompt(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    tenant: &str,
) -> Result<(), SasbotError> {
    let directory = open_directory(db_path, backend)?;
    let config = directory.tenant_config(&TenantId::from(tenant))?;

    for name in &config.unresolved_placeholders {
        tracing::warn!(
            event = "template_unresolved",
            tenant_id = %tenant,
            placeholder = %name,
            "Prompt template uses a placeholder with no value"
        );
    }

    if json_mode {
        print_json(&serde_json::json!(api::ConfigResponse::from(config)));
        return Ok(());
    }

    println!("{}", config.system_prompt);
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the directory for a backend name.
pub fn open_directory(db_path: &Path, backend: &str) -> Result<Directory, SasbotError> {
    match backend {
        "redb" => Directory::with_redb(db_path),
        "memory" => Ok(Directory::new()),
        other => Err(SasbotError::invalid(
            "backend",
            format!("unknown backend '{}'. Use: redb, memory", other),
        )),
    }
}

// =============================================================================
// TESTS
// =============================================================================
