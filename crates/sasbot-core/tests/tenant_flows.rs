//! # Tenant Flow Tests
//!
//! End-to-end scenarios across the directory: a tenant is imported from a
//! manifest, identified by WhatsApp number, configured and messaged, on
//! both storage backends.

use chrono::{DateTime, Utc};
use sasbot_core::manifest::{
    ConfigManifest, ImageManifest, PriceField, ScheduleManifest, ServiceManifest,
    TemplateManifest, TenantManifest,
};
use sasbot_core::{
    ConfigEntry, Directory, LogMessage, Manifest, PromptSource, SasbotError, TenantId,
    TenantStatus,
};
use serde_json::json;
use tempfile::tempdir;

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp")
}

fn clinic_manifest() -> Manifest {
    Manifest {
        tenant: Some(TenantManifest {
            id: Some("clinic-1".to_string()),
            name: "Clinica Sol".to_string(),
            business_type: Some("dental".to_string()),
            whatsapp_number: Some("+598 99 123 456".to_string()),
            status: Some("active".to_string()),
            industry_template: Some("dental-v1".to_string()),
            workflow_active: Some(true),
            ..TenantManifest::default()
        }),
        configs: vec![
            ConfigManifest {
                category: "profile".to_string(),
                key: "profile".to_string(),
                value: json!({"bot_name": "Luna", "ubicacion": "Av. Brasil 2020"}),
                display_order: Some(0),
                is_active: None,
            },
            ConfigManifest {
                category: "rules".to_string(),
                key: "temas_prohibidos".to_string(),
                value: json!(["politica", "religion"]),
                display_order: Some(1),
                is_active: None,
            },
        ],
        services: vec![
            ServiceManifest {
                id: None,
                name: "Limpieza".to_string(),
                description: Some("Limpieza dental completa".to_string()),
                price: Some(PriceField::Text("1500".to_string())),
                currency: None,
                duration_minutes: Some(45),
                display_order: Some(1),
                is_active: None,
            },
            ServiceManifest {
                id: None,
                name: "Blanqueamiento".to_string(),
                description: None,
                price: Some(PriceField::Units(4000)),
                currency: Some("USD".to_string()),
                duration_minutes: None,
                display_order: Some(2),
                is_active: Some(false),
            },
        ],
        schedules: vec![
            ScheduleManifest {
                day_of_week: 1,
                start_time: Some("09:00".to_string()),
                end_time: Some("18:00".to_string()),
                is_available: true,
            },
            ScheduleManifest {
                day_of_week: 0,
                start_time: None,
                end_time: None,
                is_available: false,
            },
        ],
        images: vec![ImageManifest {
            id: None,
            url: "https://cdn.example.com/sol.jpg".to_string(),
            caption: Some("Fachada".to_string()),
            alt_text: None,
            display_order: None,
            is_active: None,
        }],
        templates: vec![TemplateManifest {
            id: "dental-v1".to_string(),
            name: "Dental".to_string(),
            business_type: "dental".to_string(),
            description: None,
            system_prompt_template: None,
            defaults: Vec::new(),
            is_active: true,
        }],
    }
}

fn run_clinic_flow(dir: &mut Directory) {
    let summary = dir.import(clinic_manifest(), now()).expect("import");
    assert!(summary.tenant_created);
    assert_eq!(summary.services, 2);
    assert_eq!(summary.templates, 1);
    let tenant_id = summary.tenant_id.expect("tenant id");
    assert_eq!(tenant_id, TenantId::from("clinic-1"));

    // The workflow engine sends the number without the plus sign.
    let identity = dir.identify_tenant("59899123456").expect("identify");
    assert_eq!(identity.tenant_id, tenant_id);
    assert_eq!(identity.status, TenantStatus::Active);
    assert!(identity.workflow_active);

    let config = dir.tenant_config(&tenant_id).expect("config");
    assert_eq!(config.prompt_source, PromptSource::Default);
    assert_eq!(config.services.len(), 1, "inactive services are hidden");
    assert_eq!(
        config.services_text,
        "• Limpieza - 1500 UYU (45 min)\n  Limpieza dental completa"
    );
    assert_eq!(
        config.availability_text,
        "Domingo: No disponible\nLunes: 09:00 - 18:00"
    );
    assert_eq!(config.images.len(), 1);
    assert!(config.system_prompt.contains("Nombre: Luna\n"));
    assert!(config.system_prompt.contains("Ubicación: Av. Brasil 2020\n"));
    assert!(
        config
            .system_prompt
            .contains("Palabras/temas a evitar: politica, religion\n")
    );

    let logged = dir
        .log_message(
            LogMessage {
                tenant_id: tenant_id.to_string(),
                phone_number: "+59891000000".to_string(),
                contact_name: Some("Ana".to_string()),
                content: Some("Hola, tienen turno?".to_string()),
                ..LogMessage::default()
            },
            now(),
        )
        .expect("log");
    assert!(logged.conversation_created);
    assert_eq!(dir.messages(&logged.conversation_id).expect("messages").len(), 1);
}

#[test]
fn clinic_flow_in_memory() {
    let mut dir = Directory::new();
    run_clinic_flow(&mut dir);
}

#[test]
fn clinic_flow_on_redb_survives_reopen() {
    let temp = tempdir().expect("temp dir");
    let db_path = temp.path().join("sasbot.db");

    {
        let mut dir = Directory::with_redb(&db_path).expect("open db");
        assert!(dir.is_persistent());
        run_clinic_flow(&mut dir);
    }

    let dir = Directory::with_redb(&db_path).expect("reopen db");
    let identity = dir.identify_tenant("+59899123456").expect("identify");
    let stats = dir.stats().expect("stats");
    assert_eq!(stats.tenants, 1);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.conversations, 1);
    assert_eq!(stats.messages, 1);
    assert_eq!(
        dir.tenant_config(&identity.tenant_id)
            .expect("config")
            .services
            .len(),
        1
    );
}

#[test]
fn reimport_updates_instead_of_duplicating() {
    let mut dir = Directory::new();
    dir.import(clinic_manifest(), now()).expect("first import");

    let mut manifest = clinic_manifest();
    manifest.services.truncate(1);
    manifest.services[0].price = Some(PriceField::Text("1800.50".to_string()));
    let summary = dir.import(manifest, now()).expect("second import");
    assert!(!summary.tenant_created);

    let config = dir
        .tenant_config(&TenantId::from("clinic-1"))
        .expect("config");
    assert_eq!(config.services.len(), 1);
    assert_eq!(
        config.services_text,
        "• Limpieza - 1800.50 UYU (45 min)\n  Limpieza dental completa"
    );
}

#[test]
fn invalid_manifest_writes_nothing() {
    let mut dir = Directory::new();
    let mut manifest = clinic_manifest();
    manifest.schedules[0].end_time = Some("08:00".to_string());

    let err = dir.import(manifest, now()).expect_err("bad schedule");
    assert!(matches!(err, SasbotError::InvalidInput { field, .. } if field == "end_time"));
    assert!(dir.tenants().expect("tenants").is_empty());
    assert!(dir.templates().expect("templates").is_empty());
}

#[test]
fn tenant_sections_need_a_tenant() {
    let mut dir = Directory::new();
    let mut manifest = clinic_manifest();
    manifest.tenant = None;
    assert!(dir.import(manifest, now()).is_err());

    let templates_only = Manifest {
        templates: clinic_manifest().templates,
        ..Manifest::default()
    };
    let summary = dir.import(templates_only, now()).expect("templates");
    assert_eq!(summary.templates, 1);
    assert_eq!(summary.tenant_id, None);
}

#[test]
fn tenant_template_overrides_industry_template() {
    let mut dir = Directory::new();
    let mut manifest = clinic_manifest();
    manifest.templates[0].system_prompt_template =
        Some("Industria: {{business_name}}".to_string());
    dir.import(manifest, now()).expect("import");

    let id = TenantId::from("clinic-1");
    let config = dir.tenant_config(&id).expect("config");
    assert_eq!(config.prompt_source, PromptSource::IndustryTemplate);
    assert_eq!(config.system_prompt, "Industria: Clinica Sol");

    let entry = ConfigEntry::new(
        id.clone(),
        "prompt",
        "template",
        &json!("Soy {{bot_name}}, atiendo {{ services }} {{ extra.nada }}"),
    )
    .expect("entry");
    dir.set_config(entry).expect("set config");

    let config = dir.tenant_config(&id).expect("config");
    assert_eq!(config.prompt_source, PromptSource::TenantTemplate);
    assert_eq!(
        config.system_prompt,
        "Soy Luna, atiendo • Limpieza - 1500 UYU (45 min)\n  Limpieza dental completa "
    );
    assert_eq!(config.unresolved_placeholders, vec!["extra.nada".to_string()]);
}

#[test]
fn duplicate_whatsapp_numbers_are_refused() {
    let mut dir = Directory::new();
    dir.import(clinic_manifest(), now()).expect("import");

    let mut other = clinic_manifest();
    if let Some(tenant) = other.tenant.as_mut() {
        tenant.id = Some("clinic-2".to_string());
        tenant.whatsapp_number = Some("+59899123456".to_string());
    }
    let err = dir.import(other, now()).expect_err("number taken");
    assert!(matches!(err, SasbotError::InvalidInput { field, .. } if field == "whatsapp_number"));
}

#[test]
fn suspended_tenant_is_refused_but_deleted_is_unknown() {
    let mut dir = Directory::new();
    dir.import(clinic_manifest(), now()).expect("import");
    let id = TenantId::from("clinic-1");

    dir.set_status(&id, TenantStatus::Cancelled).expect("cancel");
    assert_eq!(
        dir.identify_tenant("+59899123456"),
        Err(SasbotError::TenantInactive(TenantStatus::Cancelled))
    );

    dir.delete_tenant(&id, now()).expect("delete");
    assert!(matches!(
        dir.tenant_config(&id),
        Err(SasbotError::TenantNotFound(_))
    ));
}
