//! `FieldMap`: the ordered name → value map behind every settings request.
//!
//! A `FieldMap` is either the stored snapshot (loaded on GET) or a pending
//! submission (parsed on POST).  In both cases it is built fresh for the
//! request and replaced as a whole; there is no merging with an earlier map.
//!
//! # Invariants
//!
//! - At most one value per field name.  Inserting an existing name replaces
//!   the old value (last write wins).
//! - Only string values are kept.  Stored blobs may carry other JSON types
//!   written by older or newer plugin versions; those are skipped on load.
//! - Iteration order is the lexical order of field names, so rendering and
//!   persistence are deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Name of the form button that posts the settings page.
///
/// Browsers send the clicked submit button as an ordinary form field; it is
/// a control, not a setting, so it never reaches validation or storage.
pub const RESERVED_SUBMIT_FIELD: &str = "submit";

/// Ordered mapping from field name to its string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    values: BTreeMap<String, String>,
}

impl FieldMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from a stored settings blob, dropping non-string values.
    pub fn from_stored(blob: &Map<String, Value>) -> Self {
        let mut fields = Self::new();
        for (name, value) in blob {
            match value {
                Value::String(s) => {
                    debug!("got plugin config {name}={s}");
                    fields.insert(name.clone(), s.clone());
                }
                other => {
                    debug!("ignoring non-string plugin config {name}={other}");
                }
            }
        }
        fields
    }

    /// Builds a pending submission from decoded form pairs.
    ///
    /// The [`RESERVED_SUBMIT_FIELD`] control is skipped, and so is every pair
    /// whose value is empty: an empty input means "not set", not "set to the
    /// empty string".
    pub fn from_form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = Self::new();
        for (name, value) in pairs {
            let name = name.into();
            let value = value.into();
            if name == RESERVED_SUBMIT_FIELD || value.is_empty() {
                continue;
            }
            fields.insert(name, value);
        }
        fields
    }

    /// Converts the map into the JSON object layout used by settings stores.
    pub fn to_stored(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    /// Sets `name` to `value`, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    /// Returns the value of `name`, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_map_is_empty() {
        let fields = FieldMap::new();
        assert!(fields.is_empty());
        assert_eq!(fields.len(), 0);
    }

    #[test]
    fn test_insert_same_name_keeps_last_value() {
        // Arrange
        let mut fields = FieldMap::new();

        // Act
        fields.insert("issueKeyPattern", "[A-Z]+");
        let replaced = fields.insert("issueKeyPattern", "[A-Z]+-[0-9]+");

        // Assert
        assert_eq!(replaced.as_deref(), Some("[A-Z]+"));
        assert_eq!(fields.get("issueKeyPattern"), Some("[A-Z]+-[0-9]+"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_from_stored_drops_non_string_values() {
        // Arrange: a blob written by a plugin version that stored typed values
        let blob = json!({
            "issueKeyPattern": "[A-Z]+-[0-9]+",
            "requireJiraIssue": true,
            "maxCommits": 10,
            "nested": { "a": "b" },
            "nothing": null
        });
        let blob = blob.as_object().unwrap();

        // Act
        let fields = FieldMap::from_stored(blob);

        // Assert
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("issueKeyPattern"), Some("[A-Z]+-[0-9]+"));
        assert!(!fields.contains("requireJiraIssue"));
    }

    #[test]
    fn test_from_form_skips_submit_control_and_empty_values() {
        // Arrange
        let pairs = vec![
            ("submit", "Save"),
            ("issueKeyPattern", ""),
            ("requireMatchingAuthorEmail", "true"),
        ];

        // Act
        let fields = FieldMap::from_form(pairs);

        // Assert
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("requireMatchingAuthorEmail"), Some("true"));
        assert!(!fields.contains("submit"));
        assert!(!fields.contains("issueKeyPattern"));
    }

    #[test]
    fn test_from_form_with_only_empty_values_is_empty() {
        let fields = FieldMap::from_form(vec![("submit", "Save"), ("a", ""), ("b", "")]);
        assert!(fields.is_empty());
    }

    #[test]
    fn test_from_form_empty_duplicate_does_not_clear_earlier_value() {
        let fields = FieldMap::from_form(vec![("a", "1"), ("a", "")]);
        assert_eq!(fields.get("a"), Some("1"));
    }

    #[test]
    fn test_to_stored_produces_string_object() {
        let fields: FieldMap = [("b", "2"), ("a", "1")].into_iter().collect();
        let stored = fields.to_stored();
        assert_eq!(Value::Object(stored), json!({ "a": "1", "b": "2" }));
    }

    #[test]
    fn test_iter_is_in_name_order() {
        let fields: FieldMap = [("zeta", "z"), ("alpha", "a"), ("mid", "m")]
            .into_iter()
            .collect();
        let names: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let fields: FieldMap = [("requireMatchingAuthorEmail", "true")].into_iter().collect();
        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value, json!({ "requireMatchingAuthorEmail": "true" }));
    }
}
