//! Per-request context handed from the listener to the application layer.

use std::collections::BTreeMap;

use uuid::Uuid;

/// What the application layer may know about an incoming request.
///
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Identifier used to correlate log lines for one request.
    pub id: Uuid,
    headers: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            headers: BTreeMap::new(),
        }
    }

    /// Adds a header.  An earlier header of the same name is kept, so the
    /// first occurrence wins.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}
