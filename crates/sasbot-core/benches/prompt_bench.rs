//! # Prompt Benchmarks
//!
//! Performance benchmarks for prompt assembly and tenant lookups.
//!
//! Run with: `cargo bench -p sasbot-core`

use chrono::{DateTime, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sasbot_core::prompt::template::render;
use sasbot_core::{
    BusinessType, ConfigEntry, ConfigMap, Directory, IndustryTemplate, LogMessage, OnboardTenant,
    Price, PromptInputs, Schedule, Service, Tenant, TemplateId, assemble,
};
use serde_json::json;
use std::hint::black_box;

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp")
}

/// A tenant with `size` services, a full week of hours and a typical
/// profile/personality/rules configuration.
fn tenant_fixture(size: usize) -> (Tenant, ConfigMap, Vec<Service>, Vec<Schedule>) {
    let tenant = Tenant::new("Clinica Sol", "clinica-sol", BusinessType::Dental, now());

    let entries = vec![
        ConfigEntry::new(
            tenant.id.clone(),
            "profile",
            "profile",
            &json!({"bot_name": "Luna", "ubicacion": "Av. Brasil 2020", "edad": 28}),
        )
        .expect("profile"),
        ConfigEntry::new(
            tenant.id.clone(),
            "personality",
            "personality",
            &json!({"tone": "amigable", "language": "es", "greeting_message": "Hola!"}),
        )
        .expect("personality"),
        ConfigEntry::new(
            tenant.id.clone(),
            "rules",
            "temas_prohibidos",
            &json!(["politica", "religion", "precios de la competencia"]),
        )
        .expect("rules"),
    ];
    let configs = ConfigMap::from_entries(&entries).expect("config map");

    let services = (0..size)
        .map(|i| {
            Service::new(tenant.id.clone(), format!("Servicio {}", i))
                .with_price(Price::from_minor(150_050 + i as i64))
                .with_duration(30)
                .with_description("Descripcion del servicio")
        })
        .collect();

    let schedules = (0..7u8)
        .map(|day| {
            if day == 0 {
                Schedule::closed(tenant.id.clone(), day)
            } else {
                Schedule::open(tenant.id.clone(), day, "09:00", "18:00")
            }
        })
        .collect();

    (tenant, configs, services, schedules)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_default_prompt(c: &mut Criterion) {
    let mut group = c.benchmark_group("default_prompt");

    for size in [5, 50, 500].iter() {
        let (tenant, configs, services, schedules) = tenant_fixture(*size);
        let inputs = PromptInputs {
            tenant: &tenant,
            configs: &configs,
            services: &services,
            schedules: &schedules,
            industry_template: None,
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(assemble(&inputs)));
        });
    }

    group.finish();
}

fn bench_industry_template(c: &mut Criterion) {
    let mut group = c.benchmark_group("industry_template");

    let template = IndustryTemplate {
        id: TemplateId::from("dental-v1"),
        name: "Dental".to_string(),
        business_type: BusinessType::Dental,
        description: None,
        system_prompt_template: Some(
            "Eres {{bot_name}} de {{business_name}} ({{address}}).\n\
             Tono: {{tone}}\n\nServicios:\n{{services}}\n\nHorarios:\n{{availability}}\n\
             {{rules}}\n{{ profile.edad }} {{ missing.key }}"
                .to_string(),
        ),
        default_configurations: Vec::new(),
        is_active: true,
    };

    for size in [5, 50, 500].iter() {
        let (tenant, configs, services, schedules) = tenant_fixture(*size);
        let inputs = PromptInputs {
            tenant: &tenant,
            configs: &configs,
            services: &services,
            schedules: &schedules,
            industry_template: Some(&template),
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(assemble(&inputs)));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for count in [10, 100, 1000].iter() {
        let template: String = (0..*count)
            .map(|i| format!("texto {} {{{{ var_{} }}}} ", i, i % 7))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                black_box(render(&template, |name| {
                    name.strip_prefix("var_").map(str::to_string)
                }))
            });
        });
    }

    group.finish();
}

fn bench_identify_tenant(c: &mut Criterion) {
    let mut group = c.benchmark_group("identify_tenant");

    for size in [10, 100, 1000].iter() {
        let mut dir = Directory::new();
        for i in 0..*size {
            let tenant = dir
                .onboard(
                    OnboardTenant {
                        company_name: format!("Negocio {}", i),
                        ..OnboardTenant::default()
                    },
                    now(),
                )
                .expect("onboard");
            dir.set_whatsapp_number(&tenant.id, &format!("+5989{:07}", i))
                .expect("number");
        }
        let probe = format!("5989{:07}", size / 2);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(dir.identify_tenant(&probe)));
        });
    }

    group.finish();
}

fn bench_log_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_message");

    for size in [10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut dir = Directory::new();
                let tenant = dir
                    .onboard(
                        OnboardTenant {
                            company_name: "Clinica Sol".to_string(),
                            ..OnboardTenant::default()
                        },
                        now(),
                    )
                    .expect("onboard");
                for i in 0..size {
                    let _ = dir.log_message(
                        LogMessage {
                            tenant_id: tenant.id.to_string(),
                            phone_number: format!("+5989100{:04}", i % 10),
                            content: Some("Hola".to_string()),
                            ..LogMessage::default()
                        },
                        now(),
                    );
                }
                black_box(dir)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_default_prompt,
    bench_industry_template,
    bench_render,
    bench_identify_tenant,
    bench_log_message,
);

criterion_main!(benches);
