//! Ports: traits the settings workflow consumes.
//!
//! Each trait is implemented in `infrastructure` for production and mocked
//! with `mockall` in the controller tests.

use std::path::PathBuf;

use hookcfg_core::{FieldMap, UserIdentity};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::application::config_controller::FormView;
use crate::domain::request::RequestContext;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error type for settings persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored blob is not valid JSON.
    #[error("failed to parse stored settings: {0}")]
    Parse(#[source] serde_json::Error),

    /// The snapshot could not be serialised.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The stored blob is valid JSON but not an object of fields.
    #[error("stored settings under {key} are not a JSON object")]
    NotAnObject { key: String },
}

/// Error type for rendering the settings form.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer failed while reading or writing.
    #[error("I/O error while rendering: {0}")]
    Io(#[from] std::io::Error),

    /// Any other template failure (unknown template, bad data, ...).
    #[error("template error: {0}")]
    Template(String),
}

// ── Ports ─────────────────────────────────────────────────────────────────────

/// Host authentication and permission checks.
#[cfg_attr(test, mockall::automock)]
pub trait AuthGate: Send + Sync {
    /// The user behind `request`, or `None` when nobody is signed in.
    fn current_user(&self, request: &RequestContext) -> Option<UserIdentity>;

    /// `true` when `user` is an administrator or a system administrator.
    fn is_administrator(&self, user: &UserIdentity) -> bool;
}

/// Key/value persistence of whole settings snapshots.
///
/// A save replaces the snapshot under `key` in full; there is no partial
/// update and no concurrency control (the last writer wins).
#[cfg_attr(test, mockall::automock)]
pub trait SettingsStore: Send + Sync {
    /// Returns the raw stored blob, or `None` when nothing was ever saved.
    ///
    /// The blob may contain non-string values; callers filter them with
    /// [`FieldMap::from_stored`].
    fn load(&self, key: &str) -> Result<Option<Map<String, Value>>, StoreError>;

    fn save(&self, key: &str, fields: &FieldMap) -> Result<(), StoreError>;
}

/// Draws the settings form.
#[cfg_attr(test, mockall::automock)]
pub trait Renderer: Send + Sync {
    /// Renders `template_id` for `context_id` with the form data.
    fn render(
        &self,
        template_id: &str,
        context_id: &str,
        view: &FormView,
    ) -> Result<String, RenderError>;
}

/// Builds navigation URLs inside the host application.
#[cfg_attr(test, mockall::automock)]
pub trait NavBuilder: Send + Sync {
    /// Relative URL of the add-ons administration page.
    fn addons(&self) -> String;
}
