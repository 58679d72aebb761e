//! Wire records: the single JSON container written to the store.
//!
//! ```json
//! {"components":[
//!   {"componentKey":"Player_1","fields":[
//!     {"key":"Score","typeName":"int","value":"42"}
//!   ]}
//! ]}
//! ```
//!
//! Field names are part of the compatibility contract with external tooling.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One encoded field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedField {
    /// Logical key from the field marker.
    pub key: String,
    /// Type identity of the declared kind.
    pub type_name: String,
    /// Codec output, re-parseable from `type_name` alone.
    pub value: String,
}

/// All saved fields of one component instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedComponent {
    /// `<type name>_<instance id>`.
    pub component_key: String,
    /// Fields, unique by key.
    #[serde(default)]
    pub fields: Vec<SavedField>,
}

impl SavedComponent {
    /// Look up a field record.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&SavedField> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Root persisted object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedContainer {
    /// Components, unique by key.
    #[serde(default)]
    pub components: Vec<SavedComponent>,
}

impl SavedContainer {
    /// JSON of an empty container; the store default for a missing blob.
    pub const EMPTY_JSON: &'static str = r#"{"components":[]}"#;

    /// Parse a container. Blank input is an empty container.
    ///
    /// # Errors
    /// Returns `KeepsakeError::Serialization` for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the container.
    ///
    /// # Errors
    /// Returns `KeepsakeError::Serialization` if serde fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Look up a component record.
    #[must_use]
    pub fn component(&self, key: &str) -> Option<&SavedComponent> {
        self.components.iter().find(|c| c.component_key == key)
    }

    /// Replace the record with the same key in place, or append it.
    pub fn upsert(&mut self, record: SavedComponent) {
        match self
            .components
            .iter_mut()
            .find(|c| c.component_key == record.component_key)
        {
            Some(slot) => *slot = record,
            None => self.components.push(record),
        }
    }

    /// Remove a component record. Returns `true` if one was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.components.len();
        self.components.retain(|c| c.component_key != key);
        self.components.len() != before
    }

    /// Number of component records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether there are no component records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, value: &str) -> SavedComponent {
        SavedComponent {
            component_key: key.to_string(),
            fields: vec![SavedField {
                key: "Score".to_string(),
                type_name: "int".to_string(),
                value: value.to_string(),
            }],
        }
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let mut container = SavedContainer::default();
        container.upsert(record("Player_1", "42"));
        let json = container.to_json().expect("json");
        assert_eq!(
            json,
            r#"{"components":[{"componentKey":"Player_1","fields":[{"key":"Score","typeName":"int","value":"42"}]}]}"#
        );
    }

    #[test]
    fn blank_and_default_parse_as_empty() {
        assert!(SavedContainer::from_json("").expect("blank").is_empty());
        assert!(SavedContainer::from_json("  \n").expect("ws").is_empty());
        assert!(SavedContainer::from_json("{}").expect("no field").is_empty());
        assert!(SavedContainer::from_json(SavedContainer::EMPTY_JSON).expect("empty").is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(SavedContainer::from_json("{\"components\": [").is_err());
        assert!(SavedContainer::from_json("not json").is_err());
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut container = SavedContainer::default();
        container.upsert(record("A_1", "1"));
        container.upsert(record("B_1", "2"));
        container.upsert(record("A_1", "3"));

        assert_eq!(container.len(), 2);
        assert_eq!(container.components[0].component_key, "A_1");
        let a = container.component("A_1").expect("A");
        assert_eq!(a.field("Score").expect("Score").value, "3");
    }

    #[test]
    fn remove_reports_presence() {
        let mut container = SavedContainer::default();
        container.upsert(record("A_1", "1"));
        assert!(container.remove("A_1"));
        assert!(!container.remove("A_1"));
    }
}
