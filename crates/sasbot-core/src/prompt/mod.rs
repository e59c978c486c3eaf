//! # System Prompt Assembly
//!
//! Builds the instruction block handed to the language model from a
//! tenant's configuration. The source of the text is chosen in this order:
//!
//! 1. the tenant's own `prompt.template` config value,
//! 2. the `system_prompt_template` of the tenant's industry template,
//! 3. a generated default prompt.
//!
//! Templates use `{{ name }}` placeholders. Names are resolved first against
//! the built-in variables (see [`BUILTIN_VARIABLES`]) and then as
//! `category.key` paths into the grouped configuration. A template that
//! renders to nothing but whitespace falls back to the default prompt.

pub mod config_map;
pub mod labels;
pub mod template;
pub mod text;

pub use config_map::ConfigMap;
pub use labels::{Labels, Language};
pub use template::Rendered;

use crate::{IndustryTemplate, Schedule, Service, Tenant};
use serde::{Deserialize, Serialize};

/// Names every template can use without configuring anything.
pub const BUILTIN_VARIABLES: [&str; 16] = [
    "business_name",
    "business_type",
    "bot_name",
    "bot_age",
    "role_description",
    "personality",
    "tone",
    "style",
    "language",
    "address",
    "timezone",
    "services",
    "availability",
    "rules",
    "greeting_message",
    "farewell_message",
];

/// Categories searched for persona fields. The profile form stores tone,
/// style and traits inside `profile.profile`.
const PERSONA: &[&str] = &["personality", "profile"];

// Field aliases. Dashboard forms and older manifests disagree on naming.
const BOT_NAME: &[&str] = &["bot_name", "nombre"];
const ROLE: &[&str] = &["role_description", "descripcion"];
const ADDRESS: &[&str] = &["address", "ubicacion"];
const LOCATION_NOTES: &[&str] = &["location_notes", "address_instructions", "ubicacion_notas"];
const BOT_AGE: &[&str] = &["bot_age", "edad"];
const TONE: &[&str] = &["tone", "tono", "tone_description"];
const TONE_CUSTOM: &[&str] = &["tone_custom"];
const STYLE: &[&str] = &["communication_style", "estilo"];
const LANGUAGE: &[&str] = &["language", "idioma"];
const TRAITS: &[&str] = &["traits", "rasgos", "personality_traits"];
const EMOJI: &[&str] = &["emoji_style"];
const GREETING: &[&str] = &["greeting_message", "saludo"];
const FAREWELL: &[&str] = &["farewell_message", "despedida"];
const GENERAL_RULES: &[&str] = &["instrucciones_generales", "general_instructions"];
const FORBIDDEN: &[&str] = &["temas_prohibidos", "palabras_prohibidas"];
const ESCALATION: &[&str] = &["palabras_escalacion"];
const UNKNOWN_BEHAVIOR: &[&str] = &["comportamiento_desconocido"];
const OUT_OF_HOURS: &[&str] = &["auto_respuesta_fuera_horario"];
const AUTO_REPLIES: &[&str] = &["respuestas_automaticas"];

/// Where the final prompt text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptSource {
    TenantTemplate,
    IndustryTemplate,
    Default,
}

impl PromptSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TenantTemplate => "tenant_template",
            Self::IndustryTemplate => "industry_template",
            Self::Default => "default",
        }
    }
}

/// Everything the assembler reads. Services and schedules are expected to be
/// already filtered and ordered the way they should appear.
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    pub tenant: &'a Tenant,
    pub configs: &'a ConfigMap,
    pub services: &'a [Service],
    pub schedules: &'a [Schedule],
    pub industry_template: Option<&'a IndustryTemplate>,
}

/// The assembled system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub text: String,
    pub source: PromptSource,
    /// Placeholders the selected template used but nothing resolved.
    pub unresolved: Vec<String>,
}

impl PromptInputs<'_> {
    /// Label set for this tenant's prompt language.
    #[must_use]
    pub fn labels(&self) -> &'static Labels {
        Language::detect(
            self.configs.text("personality", LANGUAGE).as_deref(),
            &self.tenant.locale,
        )
        .labels()
    }

    /// Configured tone, honoring the dashboard's `custom` option.
    fn tone(&self) -> Option<String> {
        let tone = self.configs.text_in(PERSONA, TONE)?;
        if tone == "custom" {
            return self.configs.text_in(PERSONA, TONE_CUSTOM);
        }
        Some(tone)
    }

    /// Language code for the final instructions: configured, then locale.
    fn language_code(&self) -> String {
        self.configs
            .text("personality", LANGUAGE)
            .or_else(|| Some(self.tenant.locale.clone()).filter(|l| !l.trim().is_empty()))
            .unwrap_or_else(|| crate::primitives::DEFAULT_LOCALE.to_string())
    }

    /// Value of a built-in variable, or `None` when `name` is not built in.
    #[must_use]
    pub fn builtin(&self, name: &str) -> Option<String> {
        let labels = self.labels();
        let cfg = self.configs;
        let value = match name {
            "business_name" => self.tenant.name.clone(),
            "business_type" => self.tenant.business_type.as_str().to_string(),
            "bot_name" => cfg.text("profile", BOT_NAME).unwrap_or_default(),
            "bot_age" => cfg.text("profile", BOT_AGE).unwrap_or_default(),
            "role_description" => cfg.text("profile", ROLE).unwrap_or_default(),
            "address" => cfg.text("profile", ADDRESS).unwrap_or_default(),
            "personality" => self.personality_lines(labels).join("\n"),
            "tone" => self.tone().unwrap_or_else(|| labels.default_tone.to_string()),
            "style" => cfg.text_in(PERSONA, STYLE).unwrap_or_default(),
            "language" => labels.language_name(&self.language_code()).to_string(),
            "timezone" => self.tenant.timezone.clone(),
            "services" => text::services_text(self.services, labels),
            "availability" => text::availability_text(self.schedules, labels),
            "rules" => self.rules_lines(labels).join("\n"),
            "greeting_message" => cfg.text("personality", GREETING).unwrap_or_default(),
            "farewell_message" => cfg.text("personality", FAREWELL).unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }

    /// Resolve a placeholder: built-ins first, then `category.key`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.builtin(name)
            .or_else(|| self.configs.lookup_path(name))
    }

    fn profile_lines(&self, labels: &Labels) -> Vec<String> {
        let fields = [
            (labels.name, BOT_NAME),
            (labels.description, ROLE),
            (labels.location, ADDRESS),
            (labels.location_notes, LOCATION_NOTES),
            (labels.age, BOT_AGE),
        ];
        fields
            .iter()
            .filter_map(|(label, keys)| {
                self.configs
                    .text("profile", keys)
                    .map(|v| format!("{}: {}", label, v))
            })
            .collect()
    }

    fn personality_lines(&self, labels: &Labels) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(traits) = self.configs.text_in(PERSONA, TRAITS) {
            lines.push(format!("{}: {}", labels.traits, traits));
        }
        if let Some(tone) = self.tone() {
            lines.push(format!("{}: {}", labels.tone, tone));
        }
        if let Some(style) = self.configs.text_in(PERSONA, STYLE) {
            lines.push(format!("{}: {}", labels.style, style));
        }
        if let Some(code) = self.configs.text("personality", LANGUAGE) {
            lines.push(format!("{}: {}", labels.language, labels.language_name(&code)));
        }
        if let Some(emoji) = self.configs.text("personality", EMOJI) {
            lines.push(format!("{}: {}", labels.emoji, emoji));
        }
        if let Some(greeting) = self.configs.text("personality", GREETING) {
            lines.push(format!("{}: {}", labels.greeting, greeting));
        }
        if let Some(farewell) = self.configs.text("personality", FAREWELL) {
            lines.push(format!("{}: {}", labels.farewell, farewell));
        }
        lines
    }

    fn rules_lines(&self, labels: &Labels) -> Vec<String> {
        let cfg = self.configs;
        let mut lines = Vec::new();
        if let Some(general) = cfg.text("rules", GENERAL_RULES) {
            lines.push(general);
        }
        if let Some(forbidden) = cfg.text("rules", FORBIDDEN) {
            lines.push(format!("{}: {}", labels.forbidden_topics, forbidden));
        }
        if let Some(words) = cfg.text("rules", ESCALATION) {
            lines.push(format!("{}: {}", labels.escalation_words, words));
        }
        if let Some(behavior) = cfg.text("rules", UNKNOWN_BEHAVIOR) {
            lines.push(format!(
                "{}: {}",
                labels.unknown_behavior,
                labels.behavior(&behavior)
            ));
        }
        if let Some(reply) = cfg.text("rules", OUT_OF_HOURS) {
            lines.push(format!("{}: {}", labels.out_of_hours, reply));
        }
        if cfg.flag("rules", AUTO_REPLIES) {
            lines.push(format!("{}: {}", labels.auto_replies, labels.yes));
        }
        lines
    }
}

/// Assemble the system prompt for a tenant.
#[must_use]
pub fn assemble(inputs: &PromptInputs<'_>) -> AssembledPrompt {
    let tenant_template = inputs
        .configs
        .get("prompt", "template")
        .and_then(serde_json::Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .map(|t| (t, PromptSource::TenantTemplate));

    let industry_template = || {
        inputs
            .industry_template
            .filter(|t| t.is_active)
            .and_then(|t| t.system_prompt_template.as_deref())
            .filter(|t| !t.trim().is_empty())
            .map(|t| (t, PromptSource::IndustryTemplate))
    };

    if let Some((source_text, source)) = tenant_template.or_else(industry_template) {
        let rendered = template::render(source_text, |name| inputs.resolve(name));
        if !rendered.text.trim().is_empty() {
            return AssembledPrompt {
                text: rendered.text,
                source,
                unresolved: rendered.unresolved,
            };
        }
    }

    AssembledPrompt {
        text: default_prompt(inputs),
        source: PromptSource::Default,
        unresolved: Vec::new(),
    }
}

/// The generated prompt used when no template applies.
#[must_use]
pub fn default_prompt(inputs: &PromptInputs<'_>) -> String {
    let labels = inputs.labels();
    let mut prompt = format!("{} {}.\n", labels.intro, inputs.tenant.name);

    let mut section = |heading: &str, body: &str| {
        prompt.push('\n');
        prompt.push_str(heading);
        prompt.push('\n');
        prompt.push_str(body);
        if !body.is_empty() && !body.ends_with('\n') {
            prompt.push('\n');
        }
    };

    section(labels.profile_heading, &inputs.profile_lines(labels).join("\n"));
    section(
        labels.personality_heading,
        &inputs.personality_lines(labels).join("\n"),
    );
    if !inputs.services.is_empty() {
        section(
            labels.services_heading,
            &text::services_prompt_lines(inputs.services, labels),
        );
    }
    if !inputs.schedules.is_empty() {
        section(
            labels.availability_heading,
            &text::availability_text(inputs.schedules, labels),
        );
    }
    section(labels.rules_heading, &inputs.rules_lines(labels).join("\n"));

    let tone = inputs
        .tone()
        .unwrap_or_else(|| labels.default_tone.to_string());
    let finals = [
        format!(
            "- {} {}",
            labels.answer_in,
            labels.language_name(&inputs.language_code())
        ),
        format!("- {}", labels.keep_tone.replace("{}", &tone)),
        format!("- {}", labels.unknown_answer),
        format!("- {}", labels.no_invention),
    ];
    section(labels.final_heading, &finals.join("\n"));

    prompt
}
