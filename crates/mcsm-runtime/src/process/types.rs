//! Shared types for process supervision.

use std::path::PathBuf;
use std::time::Duration;

use mcsm_core::{ServerDefinition, Settings};
use serde::Serialize;

use super::console::{DEFAULT_MAX_LINES, DEFAULT_TRIM_TO};

/// Externally visible state of a managed server.
///
/// Internal STARTING/STOPPING phases are reported as the state they started
/// from, so callers only ever see these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcessStatus {
    Running { pid: u32 },
    Stopped { exit_code: Option<i32> },
    NotFound,
}

impl ProcessStatus {
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub const fn pid(&self) -> Option<u32> {
        match self {
            Self::Running { pid } => Some(*pid),
            _ => None,
        }
    }
}

/// How a stop request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopOutcome {
    /// The grace period elapsed and the process was killed.
    pub forced: bool,
    /// Exit code, when the platform reports one (signals have none).
    pub exit_code: Option<i32>,
}

/// One row of [`Supervisor::list`](super::Supervisor::list).
#[derive(Debug, Clone, Serialize)]
pub struct ServerSummary {
    #[serde(flatten)]
    pub definition: ServerDefinition,
    pub status: ProcessStatus,
}

/// Tunables of the process supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Java executable.
    pub java_path: PathBuf,
    /// Time a graceful stop may take before forced termination.
    pub grace_period: Duration,
    /// Line written to stdin to request a graceful stop.
    pub graceful_command: String,
    pub console_max_lines: usize,
    pub console_trim_to: usize,
}

impl SupervisorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            java_path: settings.java_path.clone(),
            grace_period: settings.grace_period(),
            graceful_command: settings.graceful_command.clone(),
            console_max_lines: settings.console_max_lines,
            console_trim_to: settings.console_trim_to,
        }
    }

    #[must_use]
    pub fn with_java_path(mut self, java_path: impl Into<PathBuf>) -> Self {
        self.java_path = java_path.into();
        self
    }

    #[must_use]
    pub const fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            java_path: PathBuf::from("java"),
            grace_period: Duration::from_secs(30),
            graceful_command: "stop".to_string(),
            console_max_lines: DEFAULT_MAX_LINES,
            console_trim_to: DEFAULT_TRIM_TO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let running = serde_json::to_string(&ProcessStatus::Running { pid: 42 }).unwrap();
        assert_eq!(running, r#"{"state":"running","pid":42}"#);

        let stopped = serde_json::to_string(&ProcessStatus::Stopped { exit_code: Some(0) }).unwrap();
        assert_eq!(stopped, r#"{"state":"stopped","exit_code":0}"#);

        let missing = serde_json::to_string(&ProcessStatus::NotFound).unwrap();
        assert_eq!(missing, r#"{"state":"not_found"}"#);
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = Settings::with_defaults();
        settings.grace_period_secs = 5;
        settings.graceful_command = "end".to_string();

        let config = SupervisorConfig::from_settings(&settings);
        assert_eq!(config.grace_period, Duration::from_secs(5));
        assert_eq!(config.graceful_command, "end");
        assert_eq!(config.console_max_lines, 1000);
    }
}
