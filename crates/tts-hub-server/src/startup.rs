//! Process startup: config loading, unit construction and shutdown wiring.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::Notify;

use crate::config::{self, HubSettings};
use crate::lifecycle::HubUnit;

/// Version string with the build's git sha and date.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "tts-hub-server", version = VERSION)]
pub struct Args {
    /// Control-plane bind address, e.g. 0.0.0.0:8080
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Directory holding the clip stores
    #[arg(long)]
    pub storage_root: Option<PathBuf>,

    /// Optional server config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Start one unit and serve until Ctrl-C.
pub async fn run(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let settings = apply_overrides(cfg.resolve()?, args.bind, args.storage_root);
    tracing::info!(
        bind = %settings.bind,
        stream_port = settings.stream_port,
        storage_root = %settings.storage_root.display(),
        purge = ?settings.purge,
        "starting tts-hub-server"
    );

    let mut unit = HubUnit::from_settings(settings);
    unit.start().await;
    let Some(control) = unit.control_addr() else {
        unit.close().await;
        return Err(anyhow::anyhow!("control plane failed to bind"));
    };
    tracing::info!(addr = %control, "control plane listening");
    match unit.stream_addr() {
        Some(addr) => tracing::info!(addr = %addr, "streaming server listening"),
        None => tracing::warn!("streaming server unavailable"),
    }

    let shutdown = Arc::new(Notify::new());
    let notify = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || notify.notify_one()) {
        tracing::warn!(error = %e, "failed to install ctrl-c handler");
    }
    shutdown.notified().await;
    tracing::info!("shutdown requested");
    unit.close().await;
    Ok(())
}

/// Load server config from disk or fall back to defaults.
fn load_config(path: Option<&Path>) -> Result<config::ServerConfig> {
    if let Some(path) = path {
        return config::ServerConfig::load(path);
    }
    let auto_path = std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join("config.toml")));
    match auto_path {
        Some(path) if path.exists() => config::ServerConfig::load(&path),
        _ => {
            tracing::info!("no config file found; using defaults");
            Ok(config::ServerConfig::default())
        }
    }
}

/// Command-line values win over the config file.
fn apply_overrides(
    mut settings: HubSettings,
    bind: Option<SocketAddr>,
    storage_root: Option<PathBuf>,
) -> HubSettings {
    if let Some(bind) = bind {
        settings.bind = bind;
    }
    if let Some(root) = storage_root {
        settings.storage_root = root;
    }
    settings
}
