//! Commit-checker settings page server: entry point.
//!
//! Serves the administrative settings form of the commit-checker repository
//! hook.  Administrators open the page, edit the settings, and submit; the
//! server validates every field and saves the settings only when all of them
//! pass.
//!
//! # Usage
//!
//! ```text
//! hookcfg-server [OPTIONS]
//!
//! Options:
//!   --config       <FILE>  TOML configuration file
//!   --bind         <ADDR>  Listener address [default from config: 127.0.0.1:7990]
//!   --settings-dir <DIR>   Directory for settings snapshots
//!   --admin        <USER>  Grant administrator rights (repeatable)
//!   --context-path <PATH>  URL prefix of the host application
//!   --ephemeral            Keep settings in memory only
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                | Description                           |
//! |-------------------------|---------------------------------------|
//! | `HOOKCFG_CONFIG`        | Configuration file path               |
//! | `HOOKCFG_BIND`          | Listener address                      |
//! | `HOOKCFG_SETTINGS_DIR`  | Settings snapshot directory           |
//! | `HOOKCFG_ADMINS`        | Comma-separated administrator keys    |
//! | `HOOKCFG_CONTEXT_PATH`  | URL prefix of the host application    |
//! | `RUST_LOG`              | Log filter; overrides `log_level`     |
//!
//! CLI flags win over environment variables, which win over the config file.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hookcfg_server::domain::ServerConfig;
use hookcfg_server::infrastructure::{build_state, load_config, run_server};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Settings page server for the commit-checker repository hook.
#[derive(Debug, Parser)]
#[command(
    name = "hookcfg-server",
    about = "Administrative settings form for the commit-checker repository hook",
    version
)]
struct Cli {
    /// TOML configuration file.  A missing file means "all defaults".
    #[arg(long, env = "HOOKCFG_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP listener binds to, as `ip:port`.
    #[arg(long, env = "HOOKCFG_BIND")]
    bind: Option<String>,

    /// Directory holding the settings snapshot files.
    #[arg(long, env = "HOOKCFG_SETTINGS_DIR")]
    settings_dir: Option<PathBuf>,

    /// User key granted administrator rights.  Adds to the configured list.
    #[arg(long = "admin", env = "HOOKCFG_ADMINS", value_delimiter = ',')]
    admins: Vec<String>,

    /// URL prefix the host application is mounted under, e.g. `/bitbucket`.
    #[arg(long, env = "HOOKCFG_CONTEXT_PATH")]
    context_path: Option<String>,

    /// Keep settings in memory; nothing is written to disk.
    #[arg(long)]
    ephemeral: bool,
}

impl Cli {
    /// Loads the config file and applies CLI overrides on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// the resulting bind address is not a valid `ip:port`.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = load_config(self.config.as_deref()).with_context(|| {
            format!(
                "failed to load config from {}",
                self.config
                    .as_deref()
                    .map_or("<none>".into(), |p| p.display().to_string())
            )
        })?;

        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(dir) = self.settings_dir {
            config.settings_dir = dir;
        }
        if let Some(context_path) = self.context_path {
            config.context_path = context_path;
        }
        for admin in self.admins {
            if !config.administrators.contains(&admin) {
                config.administrators.push(admin);
            }
        }

        config
            .bind_socket_addr()
            .with_context(|| format!("invalid bind address: '{}'", config.bind_address))?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ephemeral = cli.ephemeral;
    let config = cli.into_server_config()?;

    // `RUST_LOG` wins; otherwise the configured level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let addr = config.bind_socket_addr()?;
    info!("commit-checker settings server starting on {addr}");
    if config.administrators.is_empty() && config.system_administrators.is_empty() {
        tracing::warn!("no administrators configured; every request will be unauthorized");
    }

    let state = Arc::new(build_state(&config, ephemeral)?);

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(addr, state, running).await?;

    info!("commit-checker settings server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
