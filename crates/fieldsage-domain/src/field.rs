//! Field descriptors scraped from the page

use serde::{Deserialize, Serialize};

/// One editable field as seen by the page-side extractor.
///
/// Built fresh on every extraction pass and never persisted. The JSON shape
/// (`fieldId`, `fieldName`, ...) is the contract with the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Stable key derived from DOM attributes
    pub field_id: String,

    /// Human-readable label
    pub field_name: String,

    /// Currently displayed value, empty when unset
    #[serde(default)]
    pub current_value: String,

    /// Rich-text / contenteditable region
    #[serde(default)]
    pub is_editor: bool,

    /// Native `<select>` or custom dropdown widget
    #[serde(default)]
    pub is_select_like: bool,
}

impl FieldDescriptor {
    /// Create a plain field with the given id, label and value
    pub fn new(
        field_id: impl Into<String>,
        field_name: impl Into<String>,
        current_value: impl Into<String>,
    ) -> Self {
        Self {
            field_id: field_id.into(),
            field_name: field_name.into(),
            current_value: current_value.into(),
            is_editor: false,
            is_select_like: false,
        }
    }

    /// Whether the field currently shows no value
    pub fn is_empty(&self) -> bool {
        self.current_value.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape_is_camel_case() {
        let field = FieldDescriptor::new("name", "Name", "MongoDB Community Server 8.2");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["fieldId"], "name");
        assert_eq!(json["fieldName"], "Name");
        assert_eq!(json["currentValue"], "MongoDB Community Server 8.2");
        assert_eq!(json["isEditor"], false);
        assert_eq!(json["isSelectLike"], false);
    }

    #[test]
    fn test_missing_optional_keys_default() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"fieldId": "desc", "fieldName": "Description"}"#).unwrap();
        assert_eq!(field.current_value, "");
        assert!(!field.is_editor);
        assert!(field.is_empty());
    }
}
