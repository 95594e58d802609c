//! Storefront Settings Model
//!
//! One document per tenant. Only `categoryDisplaySettings` is owned by the
//! catalog engine; every other key is carried through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One row of a tenant's category display configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDisplayEntry {
    /// Category display name (non-text values read as "")
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: String,
    /// Non-negative integer slot; anything else reads as 0
    #[serde(default, deserialize_with = "lenient_order")]
    pub order: u32,
    #[serde(default = "default_true", deserialize_with = "lenient_flag")]
    pub enabled: bool,
}

impl CategoryDisplayEntry {
    pub fn new(category: impl Into<String>, order: u32, enabled: bool) -> Self {
        Self {
            category: category.into(),
            order,
            enabled,
        }
    }
}

/// Per-tenant storefront settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDocument {
    /// `null`, a non-list, or unreadable rows read as no rows
    #[serde(default, deserialize_with = "lenient_entries")]
    pub category_display_settings: Vec<CategoryDisplayEntry>,
    /// Filter/display configuration owned by other subsystems
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SettingsDocument {
    /// Replace the category list, keeping everything else
    pub fn with_categories(&self, entries: Vec<CategoryDisplayEntry>) -> Self {
        Self {
            category_display_settings: entries,
            extra: self.extra.clone(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_order<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        _ => 0,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        _ => true,
    })
}

fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<CategoryDisplayEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrelated_keys_survive_roundtrip() {
        let json = r#"{
            "categoryDisplaySettings": [{"category": "Roupas", "order": 0, "enabled": false}],
            "priceFilter": {"min": 0, "max": 500},
            "layout": "grid"
        }"#;
        let doc: SettingsDocument = serde_json::from_str(json).unwrap();
        assert_eq!(
            doc.category_display_settings,
            vec![CategoryDisplayEntry::new("Roupas", 0, false)]
        );
        assert_eq!(doc.extra.get("layout").unwrap(), "grid");

        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!(out["priceFilter"]["max"], 500);
        assert_eq!(out["categoryDisplaySettings"][0]["category"], "Roupas");
    }

    #[test]
    fn test_non_text_category_reads_as_empty() {
        let json = r#"{"categoryDisplaySettings": [{"category": 12}, {"category": null, "enabled": false}]}"#;
        let doc: SettingsDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.category_display_settings[0].category, "");
        assert!(doc.category_display_settings[0].enabled);
        assert_eq!(doc.category_display_settings[1].category, "");
        assert!(!doc.category_display_settings[1].enabled);
    }

    #[test]
    fn test_null_list_reads_as_empty() {
        let json = r#"{"categoryDisplaySettings": null, "theme": "dark"}"#;
        let doc: SettingsDocument = serde_json::from_str(json).unwrap();
        assert!(doc.category_display_settings.is_empty());
        assert_eq!(doc.extra.get("theme").unwrap(), "dark");

        let doc: SettingsDocument =
            serde_json::from_str(r#"{"categoryDisplaySettings": {"a": 1}}"#).unwrap();
        assert!(doc.category_display_settings.is_empty());
    }

    #[test]
    fn test_bad_order_reads_as_zero() {
        let json = r#"{"categoryDisplaySettings": [
            {"category": "Roupas", "order": -1, "enabled": false},
            {"category": "Tênis", "order": 1.5},
            {"category": "Bolsas", "order": "2", "enabled": "yes"},
            "not an entry",
            {"category": "Meias", "order": 3}
        ]}"#;
        let doc: SettingsDocument = serde_json::from_str(json).unwrap();
        assert_eq!(
            doc.category_display_settings,
            vec![
                CategoryDisplayEntry::new("Roupas", 0, false),
                CategoryDisplayEntry::new("Tênis", 0, true),
                CategoryDisplayEntry::new("Bolsas", 0, true),
                CategoryDisplayEntry::new("Meias", 3, true),
            ]
        );
    }

    #[test]
    fn test_missing_list_defaults_empty() {
        let doc: SettingsDocument = serde_json::from_str(r#"{"theme": "dark"}"#).unwrap();
        assert!(doc.category_display_settings.is_empty());

        let replaced = doc.with_categories(vec![CategoryDisplayEntry::new("A", 0, true)]);
        assert_eq!(replaced.extra.get("theme").unwrap(), "dark");
        assert_eq!(replaced.category_display_settings.len(), 1);
    }
}
