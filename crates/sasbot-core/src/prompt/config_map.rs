//! Bot configuration grouped by category.

use crate::{ConfigEntry, SasbotError};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// `category -> key -> value`, built from a tenant's active config entries.
///
/// Dashboard forms save a whole form as one object stored under a key equal
/// to its category (`profile.profile = {...}`). Such objects are flattened so
/// that `profile.bot_name` resolves the same way for both storage shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigMap(BTreeMap<String, BTreeMap<String, Value>>);

impl ConfigMap {
    /// Group entries in the order given; later entries win.
    ///
    /// Inactive entries are skipped.
    pub fn from_entries(entries: &[ConfigEntry]) -> Result<Self, SasbotError> {
        let mut map: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
        for entry in entries.iter().filter(|e| e.is_active) {
            let value = entry.value()?;
            let category = map.entry(entry.category.clone()).or_default();
            match value {
                Value::Object(fields) if entry.key == entry.category => {
                    for (k, v) in fields {
                        category.insert(k, v);
                    }
                }
                other => {
                    category.insert(entry.key.clone(), other);
                }
            }
        }
        Ok(Self(map))
    }

    #[must_use]
    pub fn get(&self, category: &str, key: &str) -> Option<&Value> {
        self.0.get(category).and_then(|c| c.get(key))
    }

    /// First alias of `keys` whose value renders to non-empty text.
    #[must_use]
    pub fn text(&self, category: &str, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.get(category, k))
            .map(render_value)
            .find(|s| !s.trim().is_empty())
    }

    /// [`text`](Self::text) over several categories, in order.
    #[must_use]
    pub fn text_in(&self, categories: &[&str], keys: &[&str]) -> Option<String> {
        categories.iter().find_map(|c| self.text(c, keys))
    }

    /// First alias of `keys` whose value is truthy (non-null, non-false,
    /// non-empty).
    #[must_use]
    pub fn flag(&self, category: &str, keys: &[&str]) -> bool {
        keys.iter()
            .filter_map(|k| self.get(category, k))
            .any(is_truthy)
    }

    /// Resolve a dotted `category.key` path.
    #[must_use]
    pub fn lookup_path(&self, path: &str) -> Option<String> {
        let (category, key) = path.split_once('.')?;
        self.get(category, key).map(render_value)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, BTreeMap<String, Value>> {
        self.0
    }
}

/// Render a JSON value as prompt text.
///
/// Strings are verbatim, scalars use their JSON spelling, arrays of
/// scalars are joined with `, ` and anything else is compact JSON.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.iter().all(|v| !v.is_array() && !v.is_object()) => items
            .iter()
            .map(render_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::TenantId;
    use serde_json::json;

    fn entry(category: &str, key: &str, value: Value) -> ConfigEntry {
        ConfigEntry::new(TenantId::from("t"), category, key, &value).unwrap()
    }

    #[test]
    fn form_objects_are_flattened() {
        let map = ConfigMap::from_entries(&[
            entry("profile", "profile", json!({"bot_name": "Luna", "bot_age": 25})),
            entry("rules", "temas_prohibidos", json!(["politica", "religion"])),
        ])
        .unwrap();

        assert_eq!(map.get("profile", "bot_name"), Some(&json!("Luna")));
        assert_eq!(map.text("profile", &["bot_age"]).as_deref(), Some("25"));
        assert_eq!(
            map.lookup_path("rules.temas_prohibidos").as_deref(),
            Some("politica, religion")
        );
    }

    #[test]
    fn object_under_other_key_is_kept_whole() {
        let map =
            ConfigMap::from_entries(&[entry("prompt", "extras", json!({"a": 1}))]).unwrap();
        assert_eq!(map.lookup_path("prompt.extras").as_deref(), Some(r#"{"a":1}"#));
        assert!(map.get("prompt", "a").is_none());
    }

    #[test]
    fn later_entries_win_and_inactive_are_skipped() {
        let mut hidden = entry("personality", "tono", json!("formal"));
        hidden.is_active = false;
        let map = ConfigMap::from_entries(&[
            entry("personality", "tono", json!("amigable")),
            entry("personality", "tono", json!("seductor")),
            hidden,
        ])
        .unwrap();
        assert_eq!(map.text("personality", &["tono"]).as_deref(), Some("seductor"));
    }

    #[test]
    fn text_skips_blank_aliases() {
        let map = ConfigMap::from_entries(&[
            entry("profile", "bot_name", json!("  ")),
            entry("profile", "nombre", json!("Sofia")),
        ])
        .unwrap();
        assert_eq!(
            map.text("profile", &["bot_name", "nombre"]).as_deref(),
            Some("Sofia")
        );
    }

    #[test]
    fn flags_follow_json_truthiness() {
        let map = ConfigMap::from_entries(&[
            entry("rules", "on", json!(true)),
            entry("rules", "off", json!(false)),
            entry("rules", "empty", json!([])),
        ])
        .unwrap();
        assert!(map.flag("rules", &["on"]));
        assert!(!map.flag("rules", &["off", "empty", "missing"]));
    }

    #[test]
    fn text_in_searches_categories_in_order() {
        let map = ConfigMap::from_entries(&[
            entry(
                "profile",
                "profile",
                json!({"tone_description": "calido", "communication_style": "formal"}),
            ),
            entry("personality", "tone", json!("  ")),
            entry("personality", "communication_style", json!("mixto")),
        ])
        .unwrap();
        let both = ["personality", "profile"];
        assert_eq!(
            map.text_in(&both, &["tone", "tone_description"]).as_deref(),
            Some("calido")
        );
        assert_eq!(
            map.text_in(&both, &["communication_style"]).as_deref(),
            Some("mixto")
        );
        assert_eq!(map.text_in(&both, &["missing"]), None);
    }
}
