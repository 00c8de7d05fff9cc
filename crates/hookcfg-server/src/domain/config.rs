//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for runtime settings of the
//! settings page server (not to be confused with the hook settings it edits).
//! It is read from an optional TOML file and then overridden by CLI flags.
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, so a config file only
//! needs the keys it wants to change, and a missing file yields
//! `ServerConfig::default()`.
//!
//! ```toml
//! bind_address = "0.0.0.0:7990"
//! settings_dir = "/var/lib/hookcfg"
//! administrators = ["alice"]
//! system_administrators = ["root"]
//! ```

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Storage key of the hook's settings snapshot.
pub const DEFAULT_SETTINGS_KEY: &str = "com.isroot.stash.plugin.yacc.settings";

/// All runtime configuration for the settings page server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// `host:port` the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Directory holding one JSON snapshot file per settings key.
    #[serde(default = "default_settings_dir")]
    pub settings_dir: PathBuf,
    /// Key under which the hook's settings snapshot is stored.
    #[serde(default = "default_settings_key")]
    pub settings_key: String,
    /// URL prefix the host application is mounted under (e.g. `/bitbucket`).
    #[serde(default)]
    pub context_path: String,
    /// Request header carrying the authenticated user key, set by the
    /// fronting proxy.
    #[serde(default = "default_user_header")]
    pub user_header: String,
    /// User keys with administrator rights.
    #[serde(default)]
    pub administrators: Vec<String>,
    /// User keys with system administrator rights.
    #[serde(default)]
    pub system_administrators: Vec<String>,
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Largest request body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Milliseconds a client has to send a complete request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    /// Parses [`bind_address`](Self::bind_address) into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`AddrParseError`] when the address is not `ip:port`.
    pub fn bind_socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind_address.parse()
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "127.0.0.1:7990".to_string()
}
fn default_settings_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_settings_key() -> String {
    DEFAULT_SETTINGS_KEY.to_string()
}
fn default_user_header() -> String {
    "X-Remote-User".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            settings_dir: default_settings_dir(),
            settings_key: default_settings_key(),
            context_path: String::new(),
            user_header: default_user_header(),
            administrators: Vec::new(),
            system_administrators: Vec::new(),
            log_level: default_log_level(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_address_is_loopback_7990() {
        // Arrange / Act
        let cfg = ServerConfig::default();
        // Assert
        let addr = cfg.bind_socket_addr().unwrap();
        assert_eq!(addr.port(), 7990);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_default_settings_key() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.settings_key, "com.isroot.stash.plugin.yacc.settings");
    }

    #[test]
    fn test_default_has_no_administrators() {
        let cfg = ServerConfig::default();
        assert!(cfg.administrators.is_empty());
        assert!(cfg.system_administrators.is_empty());
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: ServerConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn test_deserialize_partial_toml_overrides_defaults() {
        // Arrange
        let toml_str = r#"
bind_address = "0.0.0.0:8080"
administrators = ["alice", "bob"]
"#;

        // Act
        let cfg: ServerConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.bind_address, "0.0.0.0:8080");
        assert_eq!(cfg.administrators, vec!["alice", "bob"]);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.user_header, "X-Remote-User");
        assert_eq!(cfg.max_body_bytes, 65536);
        assert_eq!(cfg.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_invalid_bind_address_is_an_error() {
        let cfg = ServerConfig {
            bind_address: "not-an-address".to_string(),
            ..ServerConfig::default()
        };
        assert!(cfg.bind_socket_addr().is_err());
    }
}
