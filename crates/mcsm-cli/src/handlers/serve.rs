//! `mcsm serve`.

use std::path::Path;

use anyhow::{Context, Result};
use mcsm_axum::{ServerConfig, start_server};
use mcsm_core::Settings;
use tracing::info;

/// Overrides given on the command line.
#[derive(Debug, Default, Clone)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub http_port: Option<u16>,
    pub ws_port: Option<u16>,
}

/// Load settings from `config` and apply the overrides.
pub fn resolve_settings(config: &Path, overrides: ServeOverrides) -> Result<Settings> {
    let mut settings = Settings::load(config)
        .with_context(|| format!("loading settings from {}", config.display()))?;
    if let Some(host) = overrides.host {
        settings.host = host;
    }
    if let Some(port) = overrides.http_port {
        settings.http_port = port;
    }
    if let Some(port) = overrides.ws_port {
        settings.ws_port = port;
    }
    settings.validate()?;
    Ok(settings)
}

/// Run until Ctrl-C.
pub async fn execute(config: &Path, overrides: ServeOverrides) -> Result<()> {
    let settings = resolve_settings(config, overrides)?;
    info!(
        host = %settings.host,
        http_port = settings.http_port,
        ws_port = settings.ws_port,
        "Starting mcsm"
    );
    start_server(ServerConfig::new(settings)).await
}
