//! Settings domain types and validation.
//!
//! Settings are read from an optional TOML file; every field has a default so
//! a partial (or missing) file is valid. Server definitions live next to the
//! settings in a JSON array (`servers_file`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::ServerDefinition;

/// Default port for the HTTP API and SSE streams.
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Default preferred port for the WebSocket transport.
pub const DEFAULT_WS_PORT: u16 = 8765;

/// Default number of consecutive ports tried before giving up.
pub const DEFAULT_MAX_PORT_ATTEMPTS: u16 = 20;

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Interface both listeners bind to.
    pub host: String,

    /// Port of the HTTP API.
    pub http_port: u16,

    /// Preferred port of the WebSocket transport.
    pub ws_port: u16,

    /// Ports tried (preferred, preferred+1, ...) before a listener gives up.
    pub max_port_attempts: u16,

    /// Java executable used to launch servers.
    pub java_path: PathBuf,

    /// Seconds a graceful stop may take before forced termination.
    pub grace_period_secs: u64,

    /// Command written to stdin to request a graceful stop.
    pub graceful_command: String,

    /// Console lines retained per server before trimming.
    pub console_max_lines: usize,

    /// Console lines kept after a trim.
    pub console_trim_to: usize,

    /// How long the broadcaster waits for an event before sending a heartbeat.
    pub poll_interval_ms: u64,

    /// Per-observer delivery timeout.
    pub send_timeout_ms: u64,

    /// Outbox capacity of each observer.
    pub observer_buffer: usize,

    /// JSON file holding the registered server definitions.
    pub servers_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Create settings with the stock defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: DEFAULT_HTTP_PORT,
            ws_port: DEFAULT_WS_PORT,
            max_port_attempts: DEFAULT_MAX_PORT_ATTEMPTS,
            java_path: PathBuf::from("java"),
            grace_period_secs: 30,
            graceful_command: "stop".to_string(),
            console_max_lines: 1000,
            console_trim_to: 800,
            poll_interval_ms: 1000,
            send_timeout_ms: 250,
            observer_buffer: 256,
            servers_file: PathBuf::from("servers.json"),
        }
    }

    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "Loaded settings file");
                Self::from_toml(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::with_defaults())
            }
            Err(source) => Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_port_attempts == 0 {
            return Err(SettingsError::ZeroPortAttempts);
        }
        if self.grace_period_secs == 0 {
            return Err(SettingsError::ZeroGracePeriod);
        }
        if self.console_max_lines == 0 || self.console_trim_to > self.console_max_lines {
            return Err(SettingsError::InvalidConsoleLimits {
                max: self.console_max_lines,
                trim_to: self.console_trim_to,
            });
        }
        if self.observer_buffer == 0 {
            return Err(SettingsError::ZeroObserverBuffer);
        }
        Ok(())
    }

    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// Settings and definition-file errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("max_port_attempts must be at least 1")]
    ZeroPortAttempts,

    #[error("grace_period_secs must be at least 1")]
    ZeroGracePeriod,

    #[error("console_trim_to ({trim_to}) must not exceed console_max_lines ({max}), which must be non-zero")]
    InvalidConsoleLimits { max: usize, trim_to: usize },

    #[error("observer_buffer must be at least 1")]
    ZeroObserverBuffer,

    #[error("Invalid server definitions file: {0}")]
    Definitions(#[from] serde_json::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read the persisted server definitions. A missing file is an empty list.
pub fn load_definitions(path: &Path) -> Result<Vec<ServerDefinition>, SettingsError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let definitions: Vec<ServerDefinition> = serde_json::from_str(&text)?;
    debug!(path = %path.display(), count = definitions.len(), "Loaded server definitions");
    Ok(definitions)
}

/// Persist server definitions as a pretty-printed JSON array.
pub fn save_definitions(path: &Path, definitions: &[ServerDefinition]) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(definitions)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.http_port, 5000);
        assert_eq!(settings.ws_port, 8765);
        assert_eq!(settings.max_port_attempts, 20);
        assert_eq!(settings.grace_period(), Duration::from_secs(30));
        assert_eq!(settings.console_max_lines, 1000);
        assert_eq!(settings.console_trim_to, 800);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml("ws_port = 9000\ngrace_period_secs = 5\n").unwrap();
        assert_eq!(settings.ws_port, 9000);
        assert_eq!(settings.grace_period_secs, 5);
        assert_eq!(settings.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(settings.graceful_command, "stop");
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let mut settings = Settings::with_defaults();
        settings.console_trim_to = 2000;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidConsoleLimits { .. })
        ));

        let mut settings = Settings::with_defaults();
        settings.max_port_attempts = 0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::ZeroPortAttempts)
        ));

        let mut settings = Settings::with_defaults();
        settings.grace_period_secs = 0;
        assert!(matches!(settings.validate(), Err(SettingsError::ZeroGracePeriod)));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Settings::from_toml("http_port = \"five\""),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::with_defaults());
    }

    #[test]
    fn test_definitions_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("servers.json");
        assert!(load_definitions(&path).unwrap().is_empty());

        let defs = vec![
            ServerDefinition::new("survival1", "/srv/survival1"),
            ServerDefinition::new("creative", "/srv/creative").with_memory("2G", "6G"),
        ];
        save_definitions(&path, &defs).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"min_memory\""));
        assert_eq!(load_definitions(&path).unwrap(), defs);
    }
}
