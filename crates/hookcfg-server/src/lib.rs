//! hookcfg-server library crate.
//!
//! This crate serves the administrative settings page of the commit-checker
//! repository hook: it shows the stored settings, validates a submitted form,
//! and saves the submission only when every field is valid.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (HTML form over HTTP)
//!         ↕
//! [hookcfg-server]
//!   ├── domain/           Pure types: ServerConfig, RequestContext, HTTP values
//!   ├── application/      Ports (traits) and the ConfigController workflow
//!   └── infrastructure/
//!         ├── settings_store/ JSON snapshot files and an in-memory store
//!         ├── auth/           Trusted-header authentication gate
//!         ├── renderer/       Handlebars form template
//!         ├── nav/            Post-save landing URL
//!         ├── config_file/    TOML server configuration
//!         └── http_server/    tokio accept loop and HTTP/1.1 framing
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `hookcfg-core` only, and talks to
//!   the outside world exclusively through the traits in `application::ports`.
//! - `infrastructure` implements those traits and owns every socket and file.

/// Domain layer: configuration and request value types (no I/O).
pub mod domain;

/// Application layer: the validate-then-persist settings workflow.
pub mod application;

/// Infrastructure layer: stores, renderer, auth gate and HTTP listener.
pub mod infrastructure;
