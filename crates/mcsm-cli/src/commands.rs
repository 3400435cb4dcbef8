//! Subcommand definitions.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API, SSE streams and WebSocket transport
    Serve {
        /// Interface to bind (overrides the settings file)
        #[arg(long)]
        host: Option<String>,
        /// HTTP API port
        #[arg(long)]
        http_port: Option<u16>,
        /// Preferred WebSocket port; the next free one is used if taken
        #[arg(long)]
        ws_port: Option<u16>,
    },

    /// Download a server jar and prepare a server directory
    Setup {
        /// Server directory
        #[arg(long, default_value = "mc_server")]
        dir: PathBuf,
        /// `latest`, `snapshot` or an exact version id
        #[arg(long, default_value = "latest")]
        version: String,
        #[arg(long, default_value = "1G")]
        min_memory: String,
        #[arg(long, default_value = "2G")]
        max_memory: String,
        /// Accept the Minecraft EULA
        #[arg(long)]
        accept_eula: bool,
        /// Download even if server.jar exists
        #[arg(long)]
        force: bool,
    },

    /// Show or edit server.properties
    Properties {
        /// Server directory
        dir: PathBuf,
        /// Set a property; may be repeated
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        set: Vec<(String, String)>,
    },
}

/// Parse `key=value`; the key must be non-empty, the value may be.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
