//! # redb-backed Tenant Storage
//!
//! A disk-backed [`TenantStore`] using the redb embedded database:
//! - ACID write transactions (a tenant and its WhatsApp index entry are
//!   written together)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are postcard-encoded. Per-tenant collections use
//! `(tenant_id, ...)` tuple keys so a tenant's rows are one range scan.

use crate::store::{
    TenantStore, check_whatsapp_claim, indexed_number, sort_configs, sort_images, sort_services,
};
use crate::{
    Conversation, ConversationId, ConfigEntry, Image, IndustryTemplate, Message, SasbotError,
    Schedule, Service, Tenant, TenantId, TemplateId,
};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Table for tenants: tenant_id -> serialized Tenant
const TENANTS: TableDefinition<&str, &[u8]> = TableDefinition::new("tenants");

/// Table for the WhatsApp index: normalized number -> tenant_id
const WHATSAPP_INDEX: TableDefinition<&str, &str> = TableDefinition::new("whatsapp_index");

/// Table for bot configuration: (tenant_id, key) -> serialized ConfigEntry
const CONFIGS: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("configs");

/// Table for services: (tenant_id, service_id) -> serialized Service
const SERVICES: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("services");

/// Table for images: (tenant_id, image_id) -> serialized Image
const IMAGES: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("images");

/// Table for schedules: (tenant_id, day_of_week) -> serialized Schedule
const SCHEDULES: TableDefinition<(&str, u8), &[u8]> = TableDefinition::new("schedules");

/// Table for industry templates: template_id -> serialized IndustryTemplate
const TEMPLATES: TableDefinition<&str, &[u8]> = TableDefinition::new("templates");

/// Table for conversations: (tenant_id, phone_number) -> serialized Conversation
const CONVERSATIONS: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("conversations");

/// Table for messages: (conversation_id, sequence) -> serialized Message
const MESSAGES: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("messages");

type TenantKeyed = TableDefinition<'static, (&'static str, &'static str), &'static [u8]>;

fn io_err(e: impl std::fmt::Display) -> SasbotError {
    SasbotError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SasbotError> {
    postcard::to_allocvec(value).map_err(|e| SasbotError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SasbotError> {
    postcard::from_bytes(bytes).map_err(|e| SasbotError::DeserializationError(e.to_string()))
}

/// A disk-backed tenant store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a tenant database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SasbotError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Create every table up front so read transactions never miss one.
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(TENANTS).map_err(io_err)?;
            let _ = write_txn.open_table(WHATSAPP_INDEX).map_err(io_err)?;
            let _ = write_txn.open_table(CONFIGS).map_err(io_err)?;
            let _ = write_txn.open_table(SERVICES).map_err(io_err)?;
            let _ = write_txn.open_table(IMAGES).map_err(io_err)?;
            let _ = write_txn.open_table(SCHEDULES).map_err(io_err)?;
            let _ = write_txn.open_table(TEMPLATES).map_err(io_err)?;
            let _ = write_txn.open_table(CONVERSATIONS).map_err(io_err)?;
            let _ = write_txn.open_table(MESSAGES).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    fn put_keyed(
        &self,
        def: TenantKeyed,
        key: (&str, &str),
        bytes: &[u8],
    ) -> Result<(), SasbotError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(def).map_err(io_err)?;
            table.insert(key, bytes).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn put_by_id(
        &self,
        def: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
        bytes: &[u8],
    ) -> Result<(), SasbotError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(def).map_err(io_err)?;
            table.insert(key, bytes).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    /// All rows of `def` whose key starts with `tenant`.
    fn tenant_rows<T: DeserializeOwned>(
        &self,
        def: TenantKeyed,
        tenant: &TenantId,
    ) -> Result<Vec<T>, SasbotError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(def).map_err(io_err)?;

        let mut rows = Vec::new();
        for entry in table.range((tenant.as_str(), "")..).map_err(io_err)? {
            let (key, value) = entry.map_err(io_err)?;
            if key.value().0 != tenant.as_str() {
                break;
            }
            rows.push(decode(value.value())?);
        }
        Ok(rows)
    }

    fn all_rows<T: DeserializeOwned>(
        &self,
        def: TableDefinition<'static, &'static str, &'static [u8]>,
    ) -> Result<Vec<T>, SasbotError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(def).map_err(io_err)?;

        let mut rows = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            rows.push(decode(value.value())?);
        }
        Ok(rows)
    }

    fn row_by_id<T: DeserializeOwned>(
        &self,
        def: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
    ) -> Result<Option<T>, SasbotError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(def).map_err(io_err)?;
        match table.get(key).map_err(io_err)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }
}

impl TenantStore for RedbStore {
    fn put_tenant(&mut self, tenant: &Tenant) -> Result<(), SasbotError> {
        let bytes = encode(tenant)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut tenants = write_txn.open_table(TENANTS).map_err(io_err)?;
            let mut index = write_txn.open_table(WHATSAPP_INDEX).map_err(io_err)?;

            if let Some(number) = indexed_number(tenant) {
                let owner = index
                    .get(number)
                    .map_err(io_err)?
                    .map(|v| TenantId::from(v.value()));
                check_whatsapp_claim(owner.as_ref(), tenant)?;
            }

            // Release the number this tenant held before the update.
            let previous: Option<Tenant> =
                match tenants.get(tenant.id.as_str()).map_err(io_err)? {
                    Some(value) => Some(decode(value.value())?),
                    None => None,
                };
            if let Some(old) = previous.and_then(|p| p.whatsapp_number) {
                let ours = index
                    .get(old.as_str())
                    .map_err(io_err)?
                    .is_some_and(|v| v.value() == tenant.id.as_str());
                if ours {
                    index.remove(old.as_str()).map_err(io_err)?;
                }
            }

            if let Some(number) = indexed_number(tenant) {
                index.insert(number, tenant.id.as_str()).map_err(io_err)?;
            }
            tenants
                .insert(tenant.id.as_str(), bytes.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn tenant(&self, id: &TenantId) -> Result<Option<Tenant>, SasbotError> {
        self.row_by_id(TENANTS, id.as_str())
    }

    fn tenant_by_whatsapp(&self, number: &str) -> Result<Option<Tenant>, SasbotError> {
        let owner = {
            let read_txn = self.db.begin_read().map_err(io_err)?;
            let index = read_txn.open_table(WHATSAPP_INDEX).map_err(io_err)?;
            index
                .get(number)
                .map_err(io_err)?
                .map(|v| TenantId::from(v.value()))
        };
        match owner {
            Some(id) => Ok(self.tenant(&id)?.filter(|t| !t.is_deleted())),
            None => Ok(None),
        }
    }

    fn tenants(&self) -> Result<Vec<Tenant>, SasbotError> {
        self.all_rows(TENANTS)
    }

    fn put_config(&mut self, entry: &ConfigEntry) -> Result<(), SasbotError> {
        let bytes = encode(entry)?;
        self.put_keyed(CONFIGS, (entry.tenant_id.as_str(), entry.key.as_str()), &bytes)
    }

    fn configs(&self, tenant: &TenantId) -> Result<Vec<ConfigEntry>, SasbotError> {
        let mut entries = self.tenant_rows(CONFIGS, tenant)?;
        sort_configs(&mut entries);
        Ok(entries)
    }

    fn put_service(&mut self, service: &Service) -> Result<(), SasbotError> {
        let bytes = encode(service)?;
        self.put_keyed(SERVICES, (service.tenant_id.as_str(), service.id.as_str()), &bytes)
    }

    fn services(&self, tenant: &TenantId) -> Result<Vec<Service>, SasbotError> {
        let mut services = self.tenant_rows(SERVICES, tenant)?;
        sort_services(&mut services);
        Ok(services)
    }

    fn put_image(&mut self, image: &Image) -> Result<(), SasbotError> {
        let bytes = encode(image)?;
        self.put_keyed(IMAGES, (image.tenant_id.as_str(), image.id.as_str()), &bytes)
    }

    fn images(&self, tenant: &TenantId) -> Result<Vec<Image>, SasbotError> {
        let mut images = self.tenant_rows(IMAGES, tenant)?;
        sort_images(&mut images);
        Ok(images)
    }

    fn put_schedule(&mut self, schedule: &Schedule) -> Result<(), SasbotError> {
        let bytes = encode(schedule)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(SCHEDULES).map_err(io_err)?;
            table
                .insert(
                    (schedule.tenant_id.as_str(), schedule.day_of_week),
                    bytes.as_slice(),
                )
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn schedules(&self, tenant: &TenantId) -> Result<Vec<Schedule>, SasbotError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SCHEDULES).map_err(io_err)?;

        let mut schedules = Vec::new();
        for entry in table
            .range((tenant.as_str(), 0u8)..=(tenant.as_str(), u8::MAX))
            .map_err(io_err)?
        {
            let (_, value) = entry.map_err(io_err)?;
            schedules.push(decode(value.value())?);
        }
        Ok(schedules)
    }

    fn put_template(&mut self, template: &IndustryTemplate) -> Result<(), SasbotError> {
        let bytes = encode(template)?;
        self.put_by_id(TEMPLATES, template.id.as_str(), &bytes)
    }

    fn template(&self, id: &TemplateId) -> Result<Option<IndustryTemplate>, SasbotError> {
        self.row_by_id(TEMPLATES, id.as_str())
    }

    fn templates(&self) -> Result<Vec<IndustryTemplate>, SasbotError> {
        self.all_rows(TEMPLATES)
    }

    fn conversation_for(
        &self,
        tenant: &TenantId,
        phone: &str,
    ) -> Result<Option<Conversation>, SasbotError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(CONVERSATIONS).map_err(io_err)?;
        match table.get((tenant.as_str(), phone)).map_err(io_err)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn put_conversation(&mut self, conversation: &Conversation) -> Result<(), SasbotError> {
        let bytes = encode(conversation)?;
        self.put_keyed(
            CONVERSATIONS,
            (
                conversation.tenant_id.as_str(),
                conversation.phone_number.as_str(),
            ),
            &bytes,
        )
    }

    fn append_message(&mut self, message: &Message) -> Result<(), SasbotError> {
        let bytes = encode(message)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(MESSAGES).map_err(io_err)?;
            table
                .insert(
                    (message.conversation_id.as_str(), message.sequence),
                    bytes.as_slice(),
                )
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn messages(&self, conversation: &ConversationId) -> Result<Vec<Message>, SasbotError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(MESSAGES).map_err(io_err)?;

        let mut messages = Vec::new();
        for entry in table
            .range((conversation.as_str(), 0u64)..=(conversation.as_str(), u64::MAX))
            .map_err(io_err)?
        {
            let (_, value) = entry.map_err(io_err)?;
            messages.push(decode(value.value())?);
        }
        Ok(messages)
    }

    fn conversation_count(&self) -> Result<u64, SasbotError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(CONVERSATIONS).map_err(io_err)?;
        table.len().map_err(io_err)
    }

    fn message_count(&self) -> Result<u64, SasbotError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(MESSAGES).map_err(io_err)?;
        table.len().map_err(io_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{BusinessType, Direction, MessageType, MessageId, Price};
    use chrono::{DateTime, Utc};
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn shop(number: &str) -> Tenant {
        let mut tenant = Tenant::new("Shop", "shop", BusinessType::Retail, now());
        tenant.whatsapp_number = Some(number.to_string());
        tenant
    }

    #[test]
    fn tenants_persist_across_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        let tenant = shop("+59899111222");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store.put_tenant(&tenant).expect("put tenant");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        assert_eq!(store.tenant(&tenant.id).unwrap(), Some(tenant.clone()));
        assert_eq!(
            store.tenant_by_whatsapp("+59899111222").unwrap().map(|t| t.id),
            Some(tenant.id)
        );
    }

    #[test]
    fn whatsapp_index_is_exclusive_and_released() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");

        let mut first = shop("123456");
        store.put_tenant(&first).unwrap();
        assert!(store.put_tenant(&shop("123456")).is_err());

        first.whatsapp_number = Some("654321".to_string());
        store.put_tenant(&first).unwrap();
        assert!(store.tenant_by_whatsapp("123456").unwrap().is_none());
        assert!(store.put_tenant(&shop("123456")).is_ok());
    }

    #[test]
    fn per_tenant_ranges_do_not_leak() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        let a = TenantId::from("a");
        let ab = TenantId::from("ab");

        store
            .put_service(&Service::new(a.clone(), "Corte").with_price(Price::from_units(300)))
            .unwrap();
        store.put_service(&Service::new(ab.clone(), "Color")).unwrap();
        store.put_schedule(&Schedule::open(a.clone(), 2, "09:00", "12:00")).unwrap();
        store.put_schedule(&Schedule::closed(a.clone(), 0)).unwrap();
        store.put_schedule(&Schedule::closed(ab.clone(), 1)).unwrap();

        let services = store.services(&a).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "Corte");

        let days: Vec<u8> = store
            .schedules(&a)
            .unwrap()
            .iter()
            .map(|s| s.day_of_week)
            .collect();
        assert_eq!(days, vec![0, 2]);
    }

    #[test]
    fn messages_are_read_in_sequence() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        let conversation = ConversationId::from("c1");

        for sequence in [2u64, 1, 3] {
            store
                .append_message(&Message {
                    id: MessageId::generate(),
                    tenant_id: TenantId::from("t"),
                    conversation_id: conversation.clone(),
                    sequence,
                    direction: Direction::Inbound,
                    message_type: MessageType::Text,
                    content: format!("m{}", sequence),
                    whatsapp_message_id: None,
                    metadata_json: None,
                    sent_at: now(),
                })
                .unwrap();
        }

        let contents: Vec<String> = store
            .messages(&conversation)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["m1", "m2", "m3"]);
        assert_eq!(store.message_count().unwrap(), 3);
        assert!(store.messages(&ConversationId::from("c2")).unwrap().is_empty());
    }
}
