//! `FieldErrors`: validation messages keyed by field name.
//!
//! A field that passed validation has no entry at all; there is never a key
//! with an empty message list.  A fresh `FieldErrors` is produced for every
//! validation run, so messages from an earlier run can never leak into a
//! later one.

use std::collections::BTreeMap;

use serde::Serialize;

/// Mapping from field name to the ordered messages that field failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `message` to the messages recorded for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Appends every message in `messages`; an empty list records nothing.
    pub fn extend(&mut self, field: &str, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }
        self.errors
            .entry(field.to_string())
            .or_default()
            .extend(messages);
    }

    /// Returns the messages for `field`, or `None` when the field is valid.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn has_errors_for(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Number of fields with at least one message.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_errors_are_empty() {
        let errors = FieldErrors::new();
        assert!(errors.is_empty());
        assert!(errors.get("anything").is_none());
    }

    #[test]
    fn test_add_keeps_messages_in_order() {
        // Arrange
        let mut errors = FieldErrors::new();

        // Act
        errors.add("issueKeyPattern", "not a valid pattern");
        errors.add("issueKeyPattern", "too long");

        // Assert
        assert_eq!(
            errors.get("issueKeyPattern").unwrap(),
            &["not a valid pattern".to_string(), "too long".to_string()]
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_extend_with_no_messages_leaves_field_absent() {
        let mut errors = FieldErrors::new();
        errors.extend("requireJiraIssue", Vec::new());
        assert!(!errors.has_errors_for("requireJiraIssue"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_serializes_as_object_of_lists() {
        let mut errors = FieldErrors::new();
        errors.add("a", "bad");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value, serde_json::json!({ "a": ["bad"] }));
    }
}
