//! # Tenant Store
//!
//! The `TenantStore` trait abstracts where tenant data lives. Two backends
//! implement it:
//! - [`MemoryStore`]: `BTreeMap`s, used for tests and `--backend memory`
//! - [`RedbStore`](crate::storage::RedbStore): disk-backed, ACID
//!
//! Both backends keep the same guarantees:
//! - listings are ordered deterministically (see the `sort_*` helpers)
//! - a WhatsApp number maps to at most one non-deleted tenant
//! - soft-deleted tenants are never returned by number lookups

use crate::{
    Conversation, ConversationId, ConfigEntry, Image, ImageId, IndustryTemplate, Message,
    SasbotError, Schedule, Service, ServiceId, Tenant, TenantId, TemplateId,
};
use std::collections::BTreeMap;

/// Storage operations needed by the [`Directory`](crate::Directory).
pub trait TenantStore {
    /// Insert or replace a tenant, keeping the WhatsApp index in sync.
    ///
    /// Fails with `InvalidInput` when the number already belongs to another
    /// non-deleted tenant.
    fn put_tenant(&mut self, tenant: &Tenant) -> Result<(), SasbotError>;

    /// Get a tenant by id, deleted or not.
    fn tenant(&self, id: &TenantId) -> Result<Option<Tenant>, SasbotError>;

    /// Exact lookup in the WhatsApp index. Deleted tenants never match.
    fn tenant_by_whatsapp(&self, number: &str) -> Result<Option<Tenant>, SasbotError>;

    /// All tenants ordered by id.
    fn tenants(&self) -> Result<Vec<Tenant>, SasbotError>;

    /// Upsert a config entry on (tenant, key).
    fn put_config(&mut self, entry: &ConfigEntry) -> Result<(), SasbotError>;

    /// A tenant's config entries ordered by display order, then key.
    fn configs(&self, tenant: &TenantId) -> Result<Vec<ConfigEntry>, SasbotError>;

    fn put_service(&mut self, service: &Service) -> Result<(), SasbotError>;

    /// A tenant's services ordered by display order, then name.
    fn services(&self, tenant: &TenantId) -> Result<Vec<Service>, SasbotError>;

    fn put_image(&mut self, image: &Image) -> Result<(), SasbotError>;

    /// A tenant's images ordered by display order, then id.
    fn images(&self, tenant: &TenantId) -> Result<Vec<Image>, SasbotError>;

    /// Upsert the schedule of one weekday.
    fn put_schedule(&mut self, schedule: &Schedule) -> Result<(), SasbotError>;

    /// A tenant's schedules ordered by day of week.
    fn schedules(&self, tenant: &TenantId) -> Result<Vec<Schedule>, SasbotError>;

    fn put_template(&mut self, template: &IndustryTemplate) -> Result<(), SasbotError>;

    fn template(&self, id: &TemplateId) -> Result<Option<IndustryTemplate>, SasbotError>;

    /// All industry templates ordered by id.
    fn templates(&self) -> Result<Vec<IndustryTemplate>, SasbotError>;

    /// The conversation between `tenant` and the contact `phone`, if any.
    fn conversation_for(
        &self,
        tenant: &TenantId,
        phone: &str,
    ) -> Result<Option<Conversation>, SasbotError>;

    fn put_conversation(&mut self, conversation: &Conversation) -> Result<(), SasbotError>;

    /// Store a message under (conversation, sequence).
    fn append_message(&mut self, message: &Message) -> Result<(), SasbotError>;

    /// Messages of one conversation in sequence order.
    fn messages(&self, conversation: &ConversationId) -> Result<Vec<Message>, SasbotError>;

    fn conversation_count(&self) -> Result<u64, SasbotError>;

    fn message_count(&self) -> Result<u64, SasbotError>;
}

// =============================================================================
// SHARED RULES
// =============================================================================

/// Refuse a WhatsApp number already claimed by a different tenant.
pub(crate) fn check_whatsapp_claim(
    owner: Option<&TenantId>,
    tenant: &Tenant,
) -> Result<(), SasbotError> {
    match owner {
        Some(owner) if owner != &tenant.id && !tenant.is_deleted() => Err(SasbotError::invalid(
            "whatsapp_number",
            format!("already assigned to tenant {}", owner),
        )),
        _ => Ok(()),
    }
}

/// The index entry a tenant should own, if any.
pub(crate) fn indexed_number(tenant: &Tenant) -> Option<&str> {
    if tenant.is_deleted() {
        return None;
    }
    tenant.whatsapp_number.as_deref().filter(|n| !n.is_empty())
}

pub(crate) fn sort_configs(entries: &mut [ConfigEntry]) {
    entries.sort_by(|a, b| (a.display_order, &a.key).cmp(&(b.display_order, &b.key)));
}

pub(crate) fn sort_services(services: &mut [Service]) {
    services.sort_by(|a, b| {
        (a.display_order, &a.name, &a.id).cmp(&(b.display_order, &b.name, &b.id))
    });
}

pub(crate) fn sort_images(images: &mut [Image]) {
    images.sort_by(|a, b| (a.display_order, &a.id).cmp(&(b.display_order, &b.id)));
}

// =============================================================================
// IN-MEMORY BACKEND
// =============================================================================

/// Volatile store backed by ordered maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tenants: BTreeMap<TenantId, Tenant>,
    whatsapp_index: BTreeMap<String, TenantId>,
    configs: BTreeMap<(TenantId, String), ConfigEntry>,
    services: BTreeMap<(TenantId, ServiceId), Service>,
    images: BTreeMap<(TenantId, ImageId), Image>,
    schedules: BTreeMap<(TenantId, u8), Schedule>,
    templates: BTreeMap<TemplateId, IndustryTemplate>,
    conversations: BTreeMap<(TenantId, String), Conversation>,
    messages: BTreeMap<(ConversationId, u64), Message>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TenantStore for MemoryStore {
    fn put_tenant(&mut self, tenant: &Tenant) -> Result<(), SasbotError> {
        if let Some(number) = indexed_number(tenant) {
            check_whatsapp_claim(self.whatsapp_index.get(number), tenant)?;
        }
        self.whatsapp_index.retain(|_, owner| owner != &tenant.id);
        if let Some(number) = indexed_number(tenant) {
            self.whatsapp_index
                .insert(number.to_string(), tenant.id.clone());
        }
        self.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(())
    }

    fn tenant(&self, id: &TenantId) -> Result<Option<Tenant>, SasbotError> {
        Ok(self.tenants.get(id).cloned())
    }

    fn tenant_by_whatsapp(&self, number: &str) -> Result<Option<Tenant>, SasbotError> {
        Ok(self
            .whatsapp_index
            .get(number)
            .and_then(|id| self.tenants.get(id))
            .filter(|t| !t.is_deleted())
            .cloned())
    }

    fn tenants(&self) -> Result<Vec<Tenant>, SasbotError> {
        Ok(self.tenants.values().cloned().collect())
    }

    fn put_config(&mut self, entry: &ConfigEntry) -> Result<(), SasbotError> {
        self.configs
            .insert((entry.tenant_id.clone(), entry.key.clone()), entry.clone());
        Ok(())
    }

    fn configs(&self, tenant: &TenantId) -> Result<Vec<ConfigEntry>, SasbotError> {
        let mut entries: Vec<ConfigEntry> = self
            .configs
            .iter()
            .filter(|((t, _), _)| t == tenant)
            .map(|(_, e)| e.clone())
            .collect();
        sort_configs(&mut entries);
        Ok(entries)
    }

    fn put_service(&mut self, service: &Service) -> Result<(), SasbotError> {
        self.services.insert(
            (service.tenant_id.clone(), service.id.clone()),
            service.clone(),
        );
        Ok(())
    }

    fn services(&self, tenant: &TenantId) -> Result<Vec<Service>, SasbotError> {
        let mut services: Vec<Service> = self
            .services
            .iter()
            .filter(|((t, _), _)| t == tenant)
            .map(|(_, s)| s.clone())
            .collect();
        sort_services(&mut services);
        Ok(services)
    }

    fn put_image(&mut self, image: &Image) -> Result<(), SasbotError> {
        self.images
            .insert((image.tenant_id.clone(), image.id.clone()), image.clone());
        Ok(())
    }

    fn images(&self, tenant: &TenantId) -> Result<Vec<Image>, SasbotError> {
        let mut images: Vec<Image> = self
            .images
            .iter()
            .filter(|((t, _), _)| t == tenant)
            .map(|(_, i)| i.clone())
            .collect();
        sort_images(&mut images);
        Ok(images)
    }

    fn put_schedule(&mut self, schedule: &Schedule) -> Result<(), SasbotError> {
        self.schedules.insert(
            (schedule.tenant_id.clone(), schedule.day_of_week),
            schedule.clone(),
        );
        Ok(())
    }

    fn schedules(&self, tenant: &TenantId) -> Result<Vec<Schedule>, SasbotError> {
        Ok(self
            .schedules
            .iter()
            .filter(|((t, _), _)| t == tenant)
            .map(|(_, s)| s.clone())
            .collect())
    }

    fn put_template(&mut self, template: &IndustryTemplate) -> Result<(), SasbotError> {
        self.templates.insert(template.id.clone(), template.clone());
        Ok(())
    }

    fn template(&self, id: &TemplateId) -> Result<Option<IndustryTemplate>, SasbotError> {
        Ok(self.templates.get(id).cloned())
    }

    fn templates(&self) -> Result<Vec<IndustryTemplate>, SasbotError> {
        Ok(self.templates.values().cloned().collect())
    }

    fn conversation_for(
        &self,
        tenant: &TenantId,
        phone: &str,
    ) -> Result<Option<Conversation>, SasbotError> {
        Ok(self
            .conversations
            .get(&(tenant.clone(), phone.to_string()))
            .cloned())
    }

    fn put_conversation(&mut self, conversation: &Conversation) -> Result<(), SasbotError> {
        self.conversations.insert(
            (
                conversation.tenant_id.clone(),
                conversation.phone_number.clone(),
            ),
            conversation.clone(),
        );
        Ok(())
    }

    fn append_message(&mut self, message: &Message) -> Result<(), SasbotError> {
        self.messages.insert(
            (message.conversation_id.clone(), message.sequence),
            message.clone(),
        );
        Ok(())
    }

    fn messages(&self, conversation: &ConversationId) -> Result<Vec<Message>, SasbotError> {
        Ok(self
            .messages
            .range((conversation.clone(), 0)..=(conversation.clone(), u64::MAX))
            .map(|(_, m)| m.clone())
            .collect())
    }

    fn conversation_count(&self) -> Result<u64, SasbotError> {
        Ok(self.conversations.len() as u64)
    }

    fn message_count(&self) -> Result<u64, SasbotError> {
        Ok(self.messages.len() as u64)
    }
}
