//! Settings persistence: JSON snapshot files and an in-memory store.
//!
//! Each settings key maps to one JSON object on disk:
//!
//! ```text
//! <settings_dir>/com.isroot.stash.plugin.yacc.settings.json
//! ```
//!
//! ```json
//! {
//!   "issueKeyPattern": "[A-Z]+-[0-9]+",
//!   "requireMatchingAuthorEmail": "true"
//! }
//! ```
//!
//! # Whole-snapshot writes
//!
//! A save writes the new snapshot to a uniquely named temporary file in the
//! same directory and renames it over the old one.  Readers therefore see
//! either the previous snapshot or the new one, never a half-written file.
//! Two concurrent saves both succeed; whichever rename lands last wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hookcfg_core::FieldMap;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::{SettingsStore, StoreError};

// ── File store ────────────────────────────────────────────────────────────────

/// Stores each settings key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    dir: PathBuf,
}

impl FileSettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for `key`.
    ///
    /// Characters other than ASCII alphanumerics, `.`, `-` and `_` are
    /// replaced with `_` so a key can never escape the settings directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self, key: &str) -> Result<Option<Map<String, Value>>, StoreError> {
        let path = self.path_for(key);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no stored settings at {}", path.display());
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        match serde_json::from_str::<Value>(&content).map_err(StoreError::Parse)? {
            Value::Object(blob) => Ok(Some(blob)),
            _ => Err(StoreError::NotAnObject {
                key: key.to_string(),
            }),
        }
    }

    fn save(&self, key: &str, fields: &FieldMap) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        let content = serde_json::to_string_pretty(&Value::Object(fields.to_stored()))
            .map_err(StoreError::Serialize)?;

        let tmp = self.dir.join(format!(".{}.tmp", Uuid::new_v4()));
        std::fs::write(&tmp, content).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| {
            // Leave no stray temp file behind on a failed rename.
            std::fs::remove_file(&tmp).ok();
            StoreError::Io {
                path: path.clone(),
                source,
            }
        })?;

        debug!("saved {} field(s) to {}", fields.len(), path.display());
        Ok(())
    }
}

// ── Memory store ──────────────────────────────────────────────────────────────

/// Keeps snapshots in process memory.  Used by tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    blobs: Mutex<HashMap<String, Map<String, Value>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw blob under `key`, bypassing [`FieldMap`].
    ///
    /// Lets callers seed values of any JSON type, as an older plugin
    /// version might have written them.
    pub fn put_raw(&self, key: &str, blob: Map<String, Value>) {
        self.lock().insert(key.to_string(), blob);
    }

    /// Current snapshot under `key` as a [`FieldMap`].
    pub fn snapshot(&self, key: &str) -> Option<FieldMap> {
        self.lock().get(key).map(FieldMap::from_stored)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Map<String, Value>>> {
        // A panic while holding the lock cannot leave a half-written map:
        // every mutation is a single insert.
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, key: &str) -> Result<Option<Map<String, Value>>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn save(&self, key: &str, fields: &FieldMap) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), fields.to_stored());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
