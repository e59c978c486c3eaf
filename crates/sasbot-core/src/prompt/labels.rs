//! Localized prompt wording.
//!
//! Spanish is the product's home language and the default. English is
//! selected when the bot's configured language (or, failing that, the
//! tenant locale) starts with `en`.

/// Language of the generated prompt text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Spanish,
    English,
}

impl Language {
    /// Pick the prompt language from the personality setting, then the locale.
    #[must_use]
    pub fn detect(configured: Option<&str>, locale: &str) -> Self {
        let code = configured
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(locale)
            .to_ascii_lowercase();
        if code.starts_with("en") || code == "english" || code == "inglés" || code == "ingles" {
            Self::English
        } else {
            Self::Spanish
        }
    }

    #[must_use]
    pub const fn labels(self) -> &'static Labels {
        match self {
            Self::Spanish => &SPANISH,
            Self::English => &ENGLISH,
        }
    }
}

/// Every fixed string the prompt builder emits.
#[derive(Debug)]
pub struct Labels {
    pub kind: Language,
    pub intro: &'static str,
    pub profile_heading: &'static str,
    pub personality_heading: &'static str,
    pub services_heading: &'static str,
    pub availability_heading: &'static str,
    pub rules_heading: &'static str,
    pub final_heading: &'static str,

    pub name: &'static str,
    pub description: &'static str,
    pub location: &'static str,
    pub location_notes: &'static str,
    pub age: &'static str,
    pub traits: &'static str,
    pub tone: &'static str,
    pub style: &'static str,
    pub language: &'static str,
    pub emoji: &'static str,
    pub greeting: &'static str,
    pub farewell: &'static str,

    pub forbidden_topics: &'static str,
    pub escalation_words: &'static str,
    pub unknown_behavior: &'static str,
    pub out_of_hours: &'static str,
    pub auto_replies: &'static str,
    pub yes: &'static str,
    pub behavior_apologize: &'static str,
    pub behavior_escalate: &'static str,
    pub behavior_generic: &'static str,

    pub answer_in: &'static str,
    /// `{}` is replaced by the tone.
    pub keep_tone: &'static str,
    pub default_tone: &'static str,
    pub unknown_answer: &'static str,
    pub no_invention: &'static str,

    pub days: [&'static str; 7],
    pub day_fallback: &'static str,
    pub unavailable: &'static str,
    pub no_schedules: &'static str,
    pub no_services: &'static str,
    pub minutes: &'static str,
}

impl Labels {
    /// Human name of a language code (`es`, `es-UY`, `en_US`, ...). Only the
    /// primary subtag is considered. Unknown codes are returned unchanged.
    #[must_use]
    pub fn language_name<'a>(&self, code: &'a str) -> &'a str {
        let english = self.kind == Language::English;
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match (primary.as_str(), english) {
            ("es", false) => "español",
            ("en", false) => "inglés",
            ("pt", false) => "portugués",
            ("fr", false) => "francés",
            ("it", false) => "italiano",
            ("es", true) => "Spanish",
            ("en", true) => "English",
            ("pt", true) => "Portuguese",
            ("fr", true) => "French",
            ("it", true) => "Italian",
            _ => code,
        }
    }

    /// Sentence for a `comportamiento_desconocido` setting.
    #[must_use]
    pub fn behavior<'a>(&self, setting: &'a str) -> &'a str {
        match setting.trim() {
            "disculparse" | "apologize" => self.behavior_apologize,
            "escalar" | "escalate" => self.behavior_escalate,
            "generico" | "genérico" | "generic" => self.behavior_generic,
            other => other,
        }
    }
}

pub static SPANISH: Labels = Labels {
    kind: Language::Spanish,
    intro: "Eres un asistente virtual para",
    profile_heading: "=== PERFIL ===",
    personality_heading: "=== PERSONALIDAD ===",
    services_heading: "=== SERVICIOS DISPONIBLES ===",
    availability_heading: "=== HORARIOS DE DISPONIBILIDAD ===",
    rules_heading: "=== REGLAS DE COMPORTAMIENTO ===",
    final_heading: "=== INSTRUCCIONES FINALES ===",

    name: "Nombre",
    description: "Descripción",
    location: "Ubicación",
    location_notes: "Cómo llegar",
    age: "Edad",
    traits: "Rasgos",
    tone: "Tono",
    style: "Estilo",
    language: "Idioma",
    emoji: "Uso de emojis",
    greeting: "Saludo",
    farewell: "Despedida",

    forbidden_topics: "Palabras/temas a evitar",
    escalation_words: "Palabras que requieren derivar a una persona",
    unknown_behavior: "Ante preguntas desconocidas",
    out_of_hours: "Respuesta fuera de horario",
    auto_replies: "Respuestas automáticas configuradas",
    yes: "Sí",
    behavior_apologize: "discúlpate y explica que no tienes esa información",
    behavior_escalate: "indica que una persona del equipo responderá pronto",
    behavior_generic: "responde de forma general sin comprometer datos",

    answer_in: "Responde siempre en",
    keep_tone: "Mantén un tono {}",
    default_tone: "profesional y amigable",
    unknown_answer: "Si te preguntan algo que no sabes, indica que consultarás y responderás pronto",
    no_invention: "Nunca inventes información sobre precios o servicios que no estén listados",

    days: [
        "Domingo",
        "Lunes",
        "Martes",
        "Miércoles",
        "Jueves",
        "Viernes",
        "Sábado",
    ],
    day_fallback: "Día",
    unavailable: "No disponible",
    no_schedules: "Horarios no configurados",
    no_services: "No hay servicios configurados",
    minutes: "min",
};

pub static ENGLISH: Labels = Labels {
    kind: Language::English,
    intro: "You are a virtual assistant for",
    profile_heading: "=== PROFILE ===",
    personality_heading: "=== PERSONALITY ===",
    services_heading: "=== AVAILABLE SERVICES ===",
    availability_heading: "=== OPENING HOURS ===",
    rules_heading: "=== BEHAVIOR RULES ===",
    final_heading: "=== FINAL INSTRUCTIONS ===",

    name: "Name",
    description: "Description",
    location: "Location",
    location_notes: "Directions",
    age: "Age",
    traits: "Traits",
    tone: "Tone",
    style: "Style",
    language: "Language",
    emoji: "Emoji usage",
    greeting: "Greeting",
    farewell: "Farewell",

    forbidden_topics: "Words/topics to avoid",
    escalation_words: "Words that require a human handoff",
    unknown_behavior: "For unknown questions",
    out_of_hours: "Out-of-hours reply",
    auto_replies: "Automatic replies configured",
    yes: "Yes",
    behavior_apologize: "apologize and explain that you do not have that information",
    behavior_escalate: "say that a team member will reply soon",
    behavior_generic: "answer in general terms without committing to details",

    answer_in: "Always answer in",
    keep_tone: "Keep a {} tone",
    default_tone: "professional and friendly",
    unknown_answer: "If you are asked something you do not know, say you will check and reply soon",
    no_invention: "Never invent information about prices or services that are not listed",

    days: [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ],
    day_fallback: "Day",
    unavailable: "Unavailable",
    no_schedules: "Opening hours not configured",
    no_services: "No services configured",
    minutes: "min",
};
