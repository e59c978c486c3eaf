//! # Tenant Directory
//!
//! The operations the workflow engine and operators call, on top of a
//! [`TenantStore`]. A `Directory` owns its storage backend:
//! - `InMemory`: [`MemoryStore`] (fast, volatile)
//! - `Persistent`: [`RedbStore`] (disk-backed, ACID)
//!
//! Every mutating operation takes `now` explicitly so that results are
//! reproducible in tests.

use crate::manifest::{Manifest, TemplateManifest, TenantManifest};
use crate::phone::{is_valid_e164, lookup_candidates, normalize_whatsapp_number};
use crate::primitives::{
    CONVERSATION_ACTIVE, MAX_CONTACT_NAME, MAX_MESSAGE_LENGTH, MAX_TEMPLATE_LENGTH,
};
use crate::prompt::{ConfigMap, PromptInputs, PromptSource, assemble, text};
use crate::slug::{slugify, unique_slug};
use crate::storage::RedbStore;
use crate::store::{MemoryStore, TenantStore};
use crate::validation::{
    validate_company_name, validate_config, validate_image, validate_schedule, validate_service,
};
use crate::{
    BusinessType, ConfigEntry, Conversation, ConversationId, DefaultConfig, Direction, Image,
    ImageId, IndustryTemplate, Message, MessageId, MessageType, SasbotError, Schedule,
    Service, ServiceId, Tenant, TenantId, TenantStatus, TemplateId,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Storage backend for a Directory.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory maps (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

// =============================================================================
// OPERATION RESULTS
// =============================================================================

/// What the workflow engine learns about the tenant behind a WhatsApp number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantIdentity {
    pub tenant_id: TenantId,
    pub name: String,
    pub slug: String,
    pub business_type: BusinessType,
    pub redis_prefix: String,
    pub is_active: bool,
    pub status: TenantStatus,
    pub subscription_plan: String,
    pub timezone: String,
    pub locale: String,
    pub workflow_active: bool,
}

impl From<&Tenant> for TenantIdentity {
    fn from(tenant: &Tenant) -> Self {
        Self {
            tenant_id: tenant.id.clone(),
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            business_type: tenant.business_type,
            redis_prefix: tenant.redis_prefix(),
            is_active: tenant.status.is_serving(),
            status: tenant.status,
            subscription_plan: tenant.subscription_plan.clone(),
            timezone: tenant.timezone.clone(),
            locale: tenant.locale.clone(),
            workflow_active: tenant.workflow_active,
        }
    }
}

/// Everything a bot run needs, with the system prompt already assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantConfig {
    pub tenant: Tenant,
    pub system_prompt: String,
    pub prompt_source: PromptSource,
    /// Template placeholders that resolved to nothing.
    pub unresolved_placeholders: Vec<String>,
    pub configs: ConfigMap,
    /// Active services in display order.
    pub services: Vec<Service>,
    pub services_text: String,
    /// Active images in display order.
    pub images: Vec<Image>,
    /// Schedules ordered by day of week.
    pub availability: Vec<Schedule>,
    pub availability_text: String,
    pub redis_prefix: String,
}

/// A message reported by the workflow engine. Only `tenant_id` and
/// `phone_number` are required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogMessage {
    pub tenant_id: String,
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub message_type: Option<String>,
    pub content: Option<String>,
    pub direction: Option<String>,
    pub whatsapp_message_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedMessage {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub conversation_created: bool,
    pub sequence: u64,
}

/// Onboarding request: a business name and an optional industry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardTenant {
    pub company_name: String,
    pub business_type: Option<String>,
    /// Explicit industry template; otherwise the first active template of
    /// the business type is used, if any.
    pub template_id: Option<String>,
}

/// Counts of what a manifest import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub tenant_id: Option<TenantId>,
    pub tenant_created: bool,
    pub templates: usize,
    pub configs: usize,
    pub services: usize,
    pub schedules: usize,
    pub images: usize,
}

/// Directory-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
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

// =============================================================================
// DIRECTORY
// =============================================================================

/// Tenant directory over an in-memory or persistent store.
#[derive(Debug, Default)]
pub struct Directory {
    backend: StorageBackend,
}

impl Directory {
    /// Create an empty directory with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) a redb-backed directory at `path`.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, SasbotError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    fn store(&self) -> &dyn TenantStore {
        match &self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn TenantStore {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    /// A tenant that exists and is not soft-deleted.
    pub fn tenant(&self, id: &TenantId) -> Result<Tenant, SasbotError> {
        self.store()
            .tenant(id)?
            .filter(|t| !t.is_deleted())
            .ok_or_else(|| SasbotError::TenantNotFound(id.to_string()))
    }

    /// All tenants that are not soft-deleted.
    pub fn tenants(&self) -> Result<Vec<Tenant>, SasbotError> {
        Ok(self
            .store()
            .tenants()?
            .into_iter()
            .filter(|t| !t.is_deleted())
            .collect())
    }

    pub fn templates(&self) -> Result<Vec<IndustryTemplate>, SasbotError> {
        self.store().templates()
    }

    // -------------------------------------------------------------------------
    // Workflow engine operations
    // -------------------------------------------------------------------------

    /// Find the tenant that owns a WhatsApp number.
    ///
    /// The number is normalized, then looked up as given, with a leading
    /// `+` and without one. Suspended and cancelled tenants are refused.
    pub fn identify_tenant(&self, raw_number: &str) -> Result<TenantIdentity, SasbotError> {
        if raw_number.trim().is_empty() {
            return Err(SasbotError::invalid(
                "whatsapp_number",
                "whatsapp_number is required",
            ));
        }
        let normalized = normalize_whatsapp_number(raw_number);

        let mut found = None;
        for candidate in lookup_candidates(&normalized) {
            if let Some(tenant) = self.store().tenant_by_whatsapp(&candidate)? {
                found = Some(tenant);
                break;
            }
        }
        let tenant = found.ok_or(SasbotError::TenantNotFound(normalized))?;

        if tenant.status.is_blocked() {
            return Err(SasbotError::TenantInactive(tenant.status));
        }
        Ok(TenantIdentity::from(&tenant))
    }

    /// Gather a tenant's configuration and assemble its system prompt.
    pub fn tenant_config(&self, id: &TenantId) -> Result<TenantConfig, SasbotError> {
        let tenant = self.tenant(id)?;
        let store = self.store();

        let configs = ConfigMap::from_entries(&store.configs(id)?)?;
        let services: Vec<Service> = store
            .services(id)?
            .into_iter()
            .filter(|s| s.is_active)
            .collect();
        let images: Vec<Image> = store
            .images(id)?
            .into_iter()
            .filter(|i| i.is_active)
            .collect();
        let schedules = store.schedules(id)?;
        let industry_template = match &tenant.industry_template_id {
            Some(template_id) => store.template(template_id)?,
            None => None,
        };

        let inputs = PromptInputs {
            tenant: &tenant,
            configs: &configs,
            services: &services,
            schedules: &schedules,
            industry_template: industry_template.as_ref(),
        };
        let labels = inputs.labels();
        let prompt = assemble(&inputs);
        let services_text = text::services_text(&services, labels);
        let availability_text = text::availability_text(&schedules, labels);
        let redis_prefix = tenant.redis_prefix();

        Ok(TenantConfig {
            tenant,
            system_prompt: prompt.text,
            prompt_source: prompt.source,
            unresolved_placeholders: prompt.unresolved,
            configs,
            services,
            services_text,
            images,
            availability: schedules,
            availability_text,
            redis_prefix,
        })
    }

    /// Append a message to the conversation between a tenant and a contact,
    /// opening the conversation on first contact.
    pub fn log_message(
        &mut self,
        input: LogMessage,
        now: DateTime<Utc>,
    ) -> Result<LoggedMessage, SasbotError> {
        let tenant_id = input.tenant_id.trim();
        let phone_number = normalize_whatsapp_number(&input.phone_number);
        if tenant_id.is_empty() || phone_number.is_empty() {
            return Err(SasbotError::invalid(
                if tenant_id.is_empty() { "tenant_id" } else { "phone_number" },
                "tenant_id and phone_number are required",
            ));
        }
        let tenant_id = TenantId::from(tenant_id);
        self.tenant(&tenant_id)?;

        let direction = match input.direction.as_deref().map(str::trim) {
            None | Some("") => Direction::Inbound,
            Some(d) => d.parse()?,
        };
        let message_type = match input.message_type.as_deref().map(str::trim) {
            None | Some("") => MessageType::Text,
            Some(t) => t.parse()?,
        };
        let content = input.content.unwrap_or_default();
        if content.len() > MAX_MESSAGE_LENGTH {
            return Err(SasbotError::invalid(
                "content",
                format!("must be at most {} bytes", MAX_MESSAGE_LENGTH),
            ));
        }
        let contact_name = input
            .contact_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if let Some(name) = &contact_name
            && name.chars().count() > MAX_CONTACT_NAME
        {
            return Err(SasbotError::invalid(
                "contact_name",
                format!("must be at most {} characters", MAX_CONTACT_NAME),
            ));
        }
        let metadata_json = match &input.metadata {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(
                serde_json::to_string(value)
                    .map_err(|e| SasbotError::SerializationError(e.to_string()))?,
            ),
        };

        let existing = self.find_conversation(&tenant_id, &phone_number)?;
        let conversation_created = existing.is_none();
        let mut conversation = existing.unwrap_or_else(|| Conversation {
            id: ConversationId::generate(),
            tenant_id: tenant_id.clone(),
            phone_number: phone_number.clone(),
            contact_name: None,
            status: CONVERSATION_ACTIVE.to_string(),
            started_at: now,
            last_message_at: now,
            message_count: 0,
        });
        if contact_name.is_some() {
            conversation.contact_name = contact_name;
        }
        conversation.message_count = conversation.message_count.saturating_add(1);
        conversation.last_message_at = now;

        let message = Message {
            id: MessageId::generate(),
            tenant_id,
            conversation_id: conversation.id.clone(),
            sequence: conversation.message_count,
            direction,
            message_type,
            content,
            whatsapp_message_id: input
                .whatsapp_message_id
                .filter(|id| !id.trim().is_empty()),
            metadata_json,
            sent_at: now,
        };

        self.store_mut().append_message(&message)?;
        self.store_mut().put_conversation(&conversation)?;

        Ok(LoggedMessage {
            conversation_id: conversation.id,
            message_id: message.id,
            conversation_created,
            sequence: message.sequence,
        })
    }

    /// The conversation with a contact, if one was logged.
    pub fn conversation(
        &self,
        tenant: &TenantId,
        phone_number: &str,
    ) -> Result<Option<Conversation>, SasbotError> {
        self.find_conversation(tenant, &normalize_whatsapp_number(phone_number))
    }

    /// A contact is the same with or without the leading `+`.
    fn find_conversation(
        &self,
        tenant: &TenantId,
        normalized: &str,
    ) -> Result<Option<Conversation>, SasbotError> {
        for candidate in lookup_candidates(normalized) {
            if let Some(conversation) = self.store().conversation_for(tenant, &candidate)? {
                return Ok(Some(conversation));
            }
        }
        Ok(None)
    }

    pub fn messages(&self, conversation: &ConversationId) -> Result<Vec<Message>, SasbotError> {
        self.store().messages(conversation)
    }

    // -------------------------------------------------------------------------
    // Onboarding and catalog management
    // -------------------------------------------------------------------------

    /// Create a trial tenant for a new business.
    ///
    /// When an industry template applies, it is linked and its default
    /// configuration is copied into the tenant.
    pub fn onboard(
        &mut self,
        request: OnboardTenant,
        now: DateTime<Utc>,
    ) -> Result<Tenant, SasbotError> {
        validate_company_name(&request.company_name)?;
        let business_type: BusinessType = request
            .business_type
            .as_deref()
            .unwrap_or_default()
            .parse()?;

        let template = match request.template_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(
                self.store()
                    .template(&TemplateId::from(id))?
                    .ok_or_else(|| SasbotError::NotFound(format!("industry template {}", id)))?,
            ),
            _ => self
                .store()
                .templates()?
                .into_iter()
                .find(|t| t.is_active && t.business_type == business_type),
        };

        let name = request.company_name.trim();
        let mut tenant = Tenant::new(name, unique_slug(name, now), business_type, now);
        tenant.industry_template_id = template.as_ref().map(|t| t.id.clone());

        self.store_mut().put_tenant(&tenant)?;
        if let Some(template) = &template {
            self.seed_defaults(&tenant.id, &template.default_configurations)?;
        }
        Ok(tenant)
    }

    fn seed_defaults(
        &mut self,
        tenant: &TenantId,
        defaults: &[DefaultConfig],
    ) -> Result<(), SasbotError> {
        for (order, default) in defaults.iter().enumerate() {
            let entry = ConfigEntry {
                tenant_id: tenant.clone(),
                category: default.category.clone(),
                key: default.key.clone(),
                value_json: default.value_json.clone(),
                display_order: i32::try_from(order).unwrap_or(i32::MAX),
                is_active: true,
            };
            self.store_mut().put_config(&entry)?;
        }
        Ok(())
    }

    /// Upsert one configuration key after validation.
    pub fn set_config(&mut self, entry: ConfigEntry) -> Result<(), SasbotError> {
        self.tenant(&entry.tenant_id)?;
        validate_config(&entry)?;
        self.store_mut().put_config(&entry)
    }

    /// Insert or replace a service after validation.
    pub fn put_service(&mut self, service: Service) -> Result<(), SasbotError> {
        self.tenant(&service.tenant_id)?;
        validate_service(&service)?;
        self.store_mut().put_service(&service)
    }

    /// Set the hours of one weekday after validation.
    pub fn put_schedule(&mut self, schedule: Schedule) -> Result<(), SasbotError> {
        self.tenant(&schedule.tenant_id)?;
        validate_schedule(&schedule)?;
        self.store_mut().put_schedule(&schedule)
    }

    pub fn put_image(&mut self, image: Image) -> Result<(), SasbotError> {
        self.tenant(&image.tenant_id)?;
        validate_image(&image)?;
        self.store_mut().put_image(&image)
    }

    /// Insert or replace an industry template after validation.
    pub fn put_template(&mut self, template: IndustryTemplate) -> Result<(), SasbotError> {
        validate_template(&template)?;
        self.store_mut().put_template(&template)
    }

    /// Assign (or clear, with an empty string) a tenant's WhatsApp number.
    pub fn set_whatsapp_number(
        &mut self,
        id: &TenantId,
        raw_number: &str,
    ) -> Result<Tenant, SasbotError> {
        let mut tenant = self.tenant(id)?;
        tenant.whatsapp_number = checked_number(raw_number)?;
        self.store_mut().put_tenant(&tenant)?;
        Ok(tenant)
    }

    pub fn set_status(&mut self, id: &TenantId, status: TenantStatus) -> Result<Tenant, SasbotError> {
        let mut tenant = self.tenant(id)?;
        tenant.status = status;
        self.store_mut().put_tenant(&tenant)?;
        Ok(tenant)
    }

    /// Soft-delete a tenant. Its WhatsApp number becomes free again.
    pub fn delete_tenant(&mut self, id: &TenantId, now: DateTime<Utc>) -> Result<(), SasbotError> {
        let mut tenant = self.tenant(id)?;
        tenant.deleted_at = Some(now);
        self.store_mut().put_tenant(&tenant)
    }

    // -------------------------------------------------------------------------
    // Manifest import
    // -------------------------------------------------------------------------

    /// Apply a manifest.
    ///
    /// Every record is built and validated before anything is written, so a
    /// manifest with a bad service leaves the store untouched.
    pub fn import(
        &mut self,
        manifest: Manifest,
        now: DateTime<Utc>,
    ) -> Result<ImportSummary, SasbotError> {
        let templates = manifest
            .templates
            .iter()
            .map(template_from_manifest)
            .collect::<Result<Vec<_>, _>>()?;

        let Some(spec) = &manifest.tenant else {
            if manifest.has_tenant_data() {
                return Err(SasbotError::invalid(
                    "tenant",
                    "configs, services, schedules and images need a [tenant] section",
                ));
            }
            let count = templates.len();
            for template in templates {
                self.put_template(template)?;
            }
            return Ok(ImportSummary {
                templates: count,
                ..ImportSummary::default()
            });
        };

        let (tenant, created) = self.tenant_from_manifest(spec, &templates, now)?;
        let tid = tenant.id.clone();

        let mut configs = Vec::with_capacity(manifest.configs.len());
        for c in &manifest.configs {
            let mut entry = ConfigEntry::new(tid.clone(), c.category.trim(), c.key.trim(), &c.value)?;
            entry.display_order = c.display_order.unwrap_or_default();
            entry.is_active = c.is_active.unwrap_or(true);
            validate_config(&entry)?;
            configs.push(entry);
        }

        let existing_services = if created {
            Vec::new()
        } else {
            self.store().services(&tid)?
        };
        let mut services = Vec::with_capacity(manifest.services.len());
        for s in &manifest.services {
            let id = match &s.id {
                Some(id) => ServiceId::from(id.as_str()),
                None => existing_services
                    .iter()
                    .find(|e| e.name == s.name.trim())
                    .map(|e| e.id.clone())
                    .unwrap_or_else(ServiceId::generate),
            };
            let mut service = Service::new(tid.clone(), s.name.trim());
            service.id = id;
            service.description = s.description.clone().filter(|d| !d.trim().is_empty());
            service.price = s.price.as_ref().map(|p| p.to_price()).transpose()?;
            if let Some(currency) = &s.currency {
                service.currency = currency.trim().to_string();
            }
            service.duration_minutes = s.duration_minutes;
            service.display_order = s.display_order.unwrap_or_default();
            service.is_active = s.is_active.unwrap_or(true);
            validate_service(&service)?;
            services.push(service);
        }

        let mut schedules = Vec::with_capacity(manifest.schedules.len());
        for s in &manifest.schedules {
            let schedule = Schedule {
                tenant_id: tid.clone(),
                day_of_week: s.day_of_week,
                start_time: s.start_time.clone(),
                end_time: s.end_time.clone(),
                is_available: s.is_available,
            };
            validate_schedule(&schedule)?;
            schedules.push(schedule);
        }

        let mut images = Vec::with_capacity(manifest.images.len());
        for i in &manifest.images {
            let image = Image {
                id: i
                    .id
                    .as_deref()
                    .map(ImageId::from)
                    .unwrap_or_else(ImageId::generate),
                tenant_id: tid.clone(),
                url: i.url.trim().to_string(),
                caption: i.caption.clone(),
                alt_text: i.alt_text.clone(),
                display_order: i.display_order.unwrap_or_default(),
                is_active: i.is_active.unwrap_or(true),
            };
            validate_image(&image)?;
            images.push(image);
        }

        let summary = ImportSummary {
            tenant_id: Some(tid.clone()),
            tenant_created: created,
            templates: templates.len(),
            configs: configs.len(),
            services: services.len(),
            schedules: schedules.len(),
            images: images.len(),
        };

        // All records are valid; write them.
        for template in templates.iter().cloned() {
            self.put_template(template)?;
        }
        self.store_mut().put_tenant(&tenant)?;
        if created && let Some(template_id) = &tenant.industry_template_id {
            let defaults = match templates.iter().find(|t| &t.id == template_id) {
                Some(t) => t.default_configurations.clone(),
                None => self
                    .store()
                    .template(template_id)?
                    .map(|t| t.default_configurations)
                    .unwrap_or_default(),
            };
            self.seed_defaults(&tid, &defaults)?;
        }
        for entry in configs {
            self.set_config(entry)?;
        }
        for service in services {
            self.put_service(service)?;
        }
        for schedule in schedules {
            self.put_schedule(schedule)?;
        }
        for image in images {
            self.put_image(image)?;
        }

        Ok(summary)
    }

    /// Build the tenant record described by `[tenant]`, merging into the
    /// stored tenant when `id` names one.
    fn tenant_from_manifest(
        &self,
        spec: &TenantManifest,
        templates: &[IndustryTemplate],
        now: DateTime<Utc>,
    ) -> Result<(Tenant, bool), SasbotError> {
        validate_company_name(&spec.name)?;
        let name = spec.name.trim();

        let existing = match &spec.id {
            Some(id) => self.store().tenant(&TenantId::from(id.as_str()))?,
            None => None,
        }
        .filter(|t| !t.is_deleted());
        let created = existing.is_none();

        let mut tenant = match existing {
            Some(mut tenant) => {
                tenant.name = name.to_string();
                tenant
            }
            None => {
                let slug = unique_slug(name, now);
                let mut tenant = Tenant::new(name, slug, BusinessType::Other, now);
                if let Some(id) = &spec.id {
                    tenant.id = TenantId::from(id.as_str());
                }
                tenant
            }
        };

        if let Some(slug) = &spec.slug {
            let slug = slugify(slug);
            if slug.is_empty() {
                return Err(SasbotError::invalid("slug", "must contain a letter or digit"));
            }
            tenant.slug = slug;
        }
        if let Some(business_type) = &spec.business_type {
            tenant.business_type = business_type.parse()?;
        }
        if let Some(status) = &spec.status {
            tenant.status = status.parse()?;
        }
        if let Some(raw) = &spec.whatsapp_number {
            tenant.whatsapp_number = checked_number(raw)?;
            if let Some(number) = &tenant.whatsapp_number
                && let Some(owner) = self.store().tenant_by_whatsapp(number)?
                && owner.id != tenant.id
            {
                return Err(SasbotError::invalid(
                    "whatsapp_number",
                    format!("already assigned to tenant {}", owner.id),
                ));
            }
        }
        if let Some(plan) = &spec.subscription_plan {
            tenant.subscription_plan = plan.trim().to_string();
        }
        if let Some(timezone) = &spec.timezone {
            tenant.timezone = timezone.trim().to_string();
        }
        if let Some(locale) = &spec.locale {
            tenant.locale = locale.trim().to_string();
        }
        if let Some(prefix) = &spec.redis_session_prefix {
            tenant.redis_session_prefix = Some(prefix.trim().to_string()).filter(|p| !p.is_empty());
        }
        if let Some(template_id) = &spec.industry_template {
            let id = TemplateId::from(template_id.as_str());
            let known = templates.iter().any(|t| t.id == id) || self.store().template(&id)?.is_some();
            if !known {
                return Err(SasbotError::NotFound(format!("industry template {}", id)));
            }
            tenant.industry_template_id = Some(id);
        }
        if let Some(workflow_id) = &spec.workflow_id {
            tenant.workflow_id = Some(workflow_id.clone());
        }
        if let Some(url) = &spec.workflow_webhook_url {
            tenant.workflow_webhook_url = Some(url.clone());
        }
        if let Some(active) = spec.workflow_active {
            tenant.workflow_active = active;
        }

        Ok((tenant, created))
    }

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------

    pub fn stats(&self) -> Result<DirectoryStats, SasbotError> {
        let store = self.store();
        let mut stats = DirectoryStats {
            templates: store.templates()?.len() as u64,
            conversations: store.conversation_count()?,
            messages: store.message_count()?,
            ..DirectoryStats::default()
        };
        for tenant in store.tenants()? {
            if tenant.is_deleted() {
                stats.deleted += 1;
                continue;
            }
            stats.tenants += 1;
            match tenant.status {
                TenantStatus::Active => stats.active += 1,
                TenantStatus::Trial => stats.trial += 1,
                TenantStatus::Suspended => stats.suspended += 1,
                TenantStatus::Cancelled => stats.cancelled += 1,
            }
        }
        Ok(stats)
    }
}

/// Normalize and check a WhatsApp number. Blank input clears the number.
fn checked_number(raw: &str) -> Result<Option<String>, SasbotError> {
    let normalized = normalize_whatsapp_number(raw);
    if normalized.is_empty() {
        return Ok(None);
    }
    if !is_valid_e164(&normalized) {
        return Err(SasbotError::invalid(
            "whatsapp_number",
            format!("'{}' is not an E.164 number", raw.trim()),
        ));
    }
    Ok(Some(normalized))
}

fn validate_template(template: &IndustryTemplate) -> Result<(), SasbotError> {
    if template.id.as_str().trim().is_empty() {
        return Err(SasbotError::invalid("template.id", "must not be empty"));
    }
    if template.name.trim().is_empty() {
        return Err(SasbotError::invalid("template.name", "must not be empty"));
    }
    if let Some(text) = &template.system_prompt_template
        && text.len() > MAX_TEMPLATE_LENGTH
    {
        return Err(SasbotError::invalid(
            "system_prompt_template",
            format!("must be at most {} bytes", MAX_TEMPLATE_LENGTH),
        ));
    }
    for default in &template.default_configurations {
        validate_config(&ConfigEntry {
            tenant_id: TenantId::from(""),
            category: default.category.clone(),
            key: default.key.clone(),
            value_json: default.value_json.clone(),
            display_order: 0,
            is_active: true,
        })?;
    }
    Ok(())
}

fn template_from_manifest(spec: &TemplateManifest) -> Result<IndustryTemplate, SasbotError> {
    let default_configurations = spec
        .defaults
        .iter()
        .map(|d| {
            Ok(DefaultConfig {
                category: d.category.trim().to_string(),
                key: d.key.trim().to_string(),
                value_json: serde_json::to_string(&d.value)
                    .map_err(|e| SasbotError::SerializationError(e.to_string()))?,
            })
        })
        .collect::<Result<Vec<_>, SasbotError>>()?;

    let template = IndustryTemplate {
        id: TemplateId::from(spec.id.trim()),
        name: spec.name.trim().to_string(),
        business_type: spec.business_type.parse()?,
        description: spec.description.clone(),
        system_prompt_template: spec.system_prompt_template.clone(),
        default_configurations,
        is_active: spec.is_active,
    };
    validate_template(&template)?;
    Ok(template)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn onboarded(dir: &mut Directory, name: &str, number: &str) -> Tenant {
        let tenant = dir
            .onboard(
                OnboardTenant {
                    company_name: name.to_string(),
                    ..OnboardTenant::default()
                },
                now(),
            )
            .unwrap();
        dir.set_whatsapp_number(&tenant.id, number).unwrap()
    }

    #[test]
    fn identify_tries_plus_variants() {
        let mut dir = Directory::new();
        let tenant = onboarded(&mut dir, "Clinica Sol", "59899123456");

        let identity = dir.identify_tenant(" +598 99 123 456 ").unwrap();
        assert_eq!(identity.tenant_id, tenant.id);
        assert!(identity.is_active);
        assert_eq!(identity.status, TenantStatus::Trial);
        assert_eq!(identity.redis_prefix, format!("tenant_{}", tenant.slug));
    }

    #[test]
    fn identify_errors() {
        let mut dir = Directory::new();
        let tenant = onboarded(&mut dir, "Clinica Sol", "+59899123456");

        assert!(matches!(
            dir.identify_tenant("  "),
            Err(SasbotError::InvalidInput { .. })
        ));
        assert_eq!(
            dir.identify_tenant("+1 555 0100"),
            Err(SasbotError::TenantNotFound("+15550100".to_string()))
        );

        dir.set_status(&tenant.id, TenantStatus::Suspended).unwrap();
        assert_eq!(
            dir.identify_tenant("+59899123456"),
            Err(SasbotError::TenantInactive(TenantStatus::Suspended))
        );

        dir.delete_tenant(&tenant.id, now()).unwrap();
        assert!(matches!(
            dir.identify_tenant("+59899123456"),
            Err(SasbotError::TenantNotFound(_))
        ));
    }

    #[test]
    fn log_message_opens_then_reuses_conversation() {
        let mut dir = Directory::new();
        let tenant = onboarded(&mut dir, "Shop", "+59899000000");

        let first = dir
            .log_message(
                LogMessage {
                    tenant_id: tenant.id.to_string(),
                    phone_number: "+598 91 111 111".to_string(),
                    content: Some("Hola".to_string()),
                    ..LogMessage::default()
                },
                now(),
            )
            .unwrap();
        assert!(first.conversation_created);
        assert_eq!(first.sequence, 1);

        let second = dir
            .log_message(
                LogMessage {
                    tenant_id: tenant.id.to_string(),
                    phone_number: "+59891111111".to_string(),
                    contact_name: Some("Juan".to_string()),
                    direction: Some("outbound".to_string()),
                    metadata: Some(json!({"node": "reply"})),
                    ..LogMessage::default()
                },
                now(),
            )
            .unwrap();
        assert!(!second.conversation_created);
        assert_eq!(second.conversation_id, first.conversation_id);
        assert_eq!(second.sequence, 2);

        let conversation = dir.conversation(&tenant.id, "+59891111111").unwrap().unwrap();
        assert_eq!(conversation.contact_name.as_deref(), Some("Juan"));
        assert_eq!(conversation.message_count, 2);

        let messages = dir.messages(&first.conversation_id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].direction, Direction::Outbound);
        assert_eq!(messages[1].metadata_json.as_deref(), Some(r#"{"node":"reply"}"#));

        let third = dir
            .log_message(
                LogMessage {
                    tenant_id: tenant.id.to_string(),
                    phone_number: "59891111111".to_string(),
                    ..LogMessage::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(third.conversation_id, first.conversation_id);
        assert_eq!(third.sequence, 3);
    }

    #[test]
    fn log_message_validation() {
        let mut dir = Directory::new();
        let tenant = onboarded(&mut dir, "Shop", "+59899000000");

        let missing = dir.log_message(LogMessage::default(), now());
        assert!(matches!(missing, Err(SasbotError::InvalidInput { .. })));

        let unknown = dir.log_message(
            LogMessage {
                tenant_id: "nope".to_string(),
                phone_number: "123".to_string(),
                ..LogMessage::default()
            },
            now(),
        );
        assert!(matches!(unknown, Err(SasbotError::TenantNotFound(_))));

        let bad_type = dir.log_message(
            LogMessage {
                tenant_id: tenant.id.to_string(),
                phone_number: "123".to_string(),
                message_type: Some("sticker".to_string()),
                ..LogMessage::default()
            },
            now(),
        );
        assert!(matches!(
            bad_type,
            Err(SasbotError::InvalidInput { field, .. }) if field == "message_type"
        ));
    }

    #[test]
    fn onboarding_links_template_and_seeds_defaults() {
        let mut dir = Directory::new();
        dir.put_template(IndustryTemplate {
            id: TemplateId::from("dental-v1"),
            name: "Dental".to_string(),
            business_type: BusinessType::Dental,
            description: None,
            system_prompt_template: Some("Bienvenido a {{business_name}}".to_string()),
            default_configurations: vec![DefaultConfig {
                category: "personality".to_string(),
                key: "tono".to_string(),
                value_json: r#""profesional""#.to_string(),
            }],
            is_active: true,
        })
        .unwrap();

        let tenant = dir
            .onboard(
                OnboardTenant {
                    company_name: "  Clinica Sol ".to_string(),
                    business_type: Some("dental".to_string()),
                    template_id: None,
                },
                now(),
            )
            .unwrap();
        assert_eq!(tenant.name, "Clinica Sol");
        assert!(tenant.slug.starts_with("clinica-sol-"));
        assert_eq!(tenant.status, TenantStatus::Trial);
        assert_eq!(tenant.subscription_plan, "free");
        assert_eq!(tenant.industry_template_id, Some(TemplateId::from("dental-v1")));

        let config = dir.tenant_config(&tenant.id).unwrap();
        assert_eq!(config.prompt_source, PromptSource::IndustryTemplate);
        assert_eq!(config.system_prompt, "Bienvenido a Clinica Sol");
        assert_eq!(
            config.configs.text("personality", &["tono"]).as_deref(),
            Some("profesional")
        );
    }

    #[test]
    fn onboarding_rejects_bad_input() {
        let mut dir = Directory::new();
        let short = dir.onboard(
            OnboardTenant {
                company_name: "A".to_string(),
                ..OnboardTenant::default()
            },
            now(),
        );
        assert!(short.is_err());

        let unknown_type = dir.onboard(
            OnboardTenant {
                company_name: "Astro".to_string(),
                business_type: Some("spaceship".to_string()),
                template_id: None,
            },
            now(),
        );
        assert!(unknown_type.is_err());

        let unknown_template = dir.onboard(
            OnboardTenant {
                company_name: "Astro".to_string(),
                business_type: None,
                template_id: Some("missing".to_string()),
            },
            now(),
        );
        assert!(matches!(unknown_template, Err(SasbotError::NotFound(_))));
    }

    #[test]
    fn set_whatsapp_number_checks_format() {
        let mut dir = Directory::new();
        let tenant = onboarded(&mut dir, "Shop", "+59899000000");
        assert!(dir.set_whatsapp_number(&tenant.id, "0123").is_err());
        let cleared = dir.set_whatsapp_number(&tenant.id, "").unwrap();
        assert_eq!(cleared.whatsapp_number, None);
    }

    #[test]
    fn stats_count_by_status() {
        let mut dir = Directory::new();
        let a = onboarded(&mut dir, "Alpha", "+59899000001");
        let b = onboarded(&mut dir, "Beta", "+59899000002");
        onboarded(&mut dir, "Gamma", "+59899000003");
        dir.set_status(&a.id, TenantStatus::Active).unwrap();
        dir.delete_tenant(&b.id, now()).unwrap();

        let stats = dir.stats().unwrap();
        assert_eq!(stats.tenants, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.trial, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(dir.tenants().unwrap().len(), 2);
    }

    #[test]
    fn catalog_setters_validate_before_writing() {
        let mut dir = Directory::new();
        let tenant = onboarded(&mut dir, "Clinica Sol", "+59899123456");
        let ghost = TenantId::from("ghost");

        dir.put_service(
            Service::new(tenant.id.clone(), "Limpieza")
                .with_price(crate::Price::from_minor(150_050))
                .with_duration(45),
        )
        .unwrap();
        assert!(matches!(
            dir.put_service(Service::new(tenant.id.clone(), "Ab")),
            Err(SasbotError::InvalidInput { .. })
        ));
        assert!(matches!(
            dir.put_service(Service::new(ghost.clone(), "Limpieza")),
            Err(SasbotError::TenantNotFound(_))
        ));

        dir.put_schedule(Schedule::open(tenant.id.clone(), 1, "9:00", "18:00"))
            .unwrap();
        assert!(
            dir.put_schedule(Schedule::open(tenant.id.clone(), 2, "18:00", "9:00"))
                .is_err()
        );

        let image = Image {
            id: ImageId::from("img-1"),
            tenant_id: tenant.id.clone(),
            url: "https://cdn.example.com/sillon.jpg".to_string(),
            caption: Some("Consultorio".to_string()),
            alt_text: None,
            display_order: 0,
            is_active: true,
        };
        assert!(
            dir.put_image(Image {
                url: " ".to_string(),
                ..image.clone()
            })
            .is_err()
        );
        dir.put_image(image).unwrap();

        let config = dir.tenant_config(&tenant.id).unwrap();
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].name, "Limpieza");
        assert_eq!(config.availability.len(), 1);
        assert_eq!(config.images.len(), 1);
        assert!(config.services_text.contains("1500.50"));
    }
}
