use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Name of a field recorded in history.
///
/// Unknown names survive a round trip through storage so entries written by
/// older field sets are kept intact, but the formatter does not render them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldName {
    Risk,
    SensitiveInfo,
    Other(String),
}

impl FieldName {
    pub fn as_str(&self) -> &str {
        match self {
            FieldName::Risk => "risk",
            FieldName::SensitiveInfo => "sensitive_info",
            FieldName::Other(name) => name,
        }
    }
}

impl From<String> for FieldName {
    fn from(value: String) -> Self {
        match value.as_str() {
            "risk" => FieldName::Risk,
            "sensitive_info" => FieldName::SensitiveInfo,
            _ => FieldName::Other(value),
        }
    }
}

impl From<FieldName> for String {
    fn from(value: FieldName) -> Self {
        match value {
            FieldName::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// One field's before/after values. Empty values are stored as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: FieldName,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub old_value: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub new_value: String,
}

/// Immutable audit record of a single mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub changed_by_id: Uuid,
    /// Captured when the change was made; never re-resolved.
    pub changed_by_name: String,
    pub changed_at: DateTime<Utc>,
    pub changes: Vec<FieldChange>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_unknown_field_names() {
        let change: FieldChange = serde_json::from_value(json!({
            "field": "title",
            "old_value": "a",
            "new_value": null
        }))
        .unwrap();

        assert_eq!(change.field, FieldName::Other("title".to_string()));
        assert_eq!(change.new_value, "");
        assert_eq!(serde_json::to_value(&change).unwrap()["field"], "title");
    }

    #[test]
    fn known_field_names_on_the_wire() {
        assert_eq!(serde_json::to_value(FieldName::SensitiveInfo).unwrap(), "sensitive_info");
        let field: FieldName = serde_json::from_value(json!("risk")).unwrap();
        assert_eq!(field, FieldName::Risk);
    }
}
