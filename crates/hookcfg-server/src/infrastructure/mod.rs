//! Infrastructure layer: concrete adapters for the application ports.
//!
//! [`build_state`] is the composition root: it turns a [`ServerConfig`] into
//! a fully wired [`ServerState`] ready for the HTTP listener.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use hookcfg_core::RuleSetValidator;
use tracing::info;

use crate::application::config_controller::ConfigController;
use crate::application::ports::SettingsStore;
use crate::domain::config::ServerConfig;

pub mod auth;
pub mod config_file;
pub mod http_server;
pub mod nav;
pub mod renderer;
pub mod settings_store;

pub use auth::HeaderAuthGate;
pub use config_file::{load_config, ConfigError};
pub use http_server::{
    request_context, run_server, serve, HttpError, Routes, ServerState, MAX_LINE_BYTES,
};
pub use nav::ContextPathNav;
pub use renderer::HandlebarsRenderer;
pub use settings_store::{FileSettingsStore, MemorySettingsStore};

/// Wires the controller and listener state from `config`.
///
/// With `ephemeral` set, settings live in memory and are lost on exit;
/// otherwise they are JSON files under `config.settings_dir`.
///
/// # Errors
///
/// Returns an error if the form template fails to compile.
pub fn build_state(config: &ServerConfig, ephemeral: bool) -> anyhow::Result<ServerState> {
    let store: Arc<dyn SettingsStore> = if ephemeral {
        info!("using in-memory settings store; changes are lost on exit");
        Arc::new(MemorySettingsStore::new())
    } else {
        info!("settings directory: {}", config.settings_dir.display());
        Arc::new(FileSettingsStore::new(config.settings_dir.clone()))
    };

    let validator = RuleSetValidator::commit_checker();
    let layout = validator
        .field_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let renderer = HandlebarsRenderer::new(layout).context("failed to build form renderer")?;

    let controller = ConfigController::new(
        Arc::new(HeaderAuthGate::from_config(config)),
        store,
        Arc::new(validator),
        Arc::new(renderer),
        Arc::new(ContextPathNav::new(&config.context_path)),
        config.settings_key.clone(),
    );

    Ok(ServerState {
        controller,
        routes: Routes::new(&config.context_path),
        max_body_bytes: config.max_body_bytes,
        read_timeout: Duration::from_millis(config.request_timeout_ms),
    })
}
