//! Broadcast event type shared by every producer and transport.
//!
//! Producers (the process supervisor, console readers, the setup workflow)
//! construct [`Event`] values and hand them to an [`EventSink`]. Transports
//! serialize them once and push the JSON to every connected observer.
//!
//! # Wire Format
//!
//! ```json
//! { "type": "progress", "message": "Downloading server.jar...", "percent": 40 }
//! { "type": "log", "message": "[survival1] Done (3.2s)!" }
//! { "type": "heartbeat", "message": "" }
//! ```
//!
//! `percent` is omitted when absent. Observers live outside this workspace,
//! so the shape must stay stable.
//!
//! [`EventSink`]: crate::ports::EventSink

use serde::{Deserialize, Serialize};

/// Discriminant of an [`Event`], serialized as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Step of a long-running workflow, carries a percentage.
    Progress,
    /// One line of console output or a lifecycle note.
    Log,
    /// Terminal success of a workflow.
    Success,
    /// Terminal failure of a workflow.
    Error,
    /// Keep-alive for push-stream observers.
    Heartbeat,
}

/// Immutable broadcast record.
///
/// Events carry no identity beyond their content; two events with the same
/// fields are indistinguishable and are never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    kind: EventKind,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    percent: Option<u8>,
}

impl Event {
    /// Highest accepted percentage; larger values are clamped.
    pub const MAX_PERCENT: u8 = 100;

    /// Progress step of a workflow.
    pub fn progress(message: impl Into<String>, percent: u8) -> Self {
        Self {
            kind: EventKind::Progress,
            message: message.into(),
            percent: Some(percent.min(Self::MAX_PERCENT)),
        }
    }

    /// A console line or lifecycle note.
    pub fn log(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Log,
            message: message.into(),
            percent: None,
        }
    }

    /// Terminal success. Reported at 100%.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Success,
            message: message.into(),
            percent: Some(Self::MAX_PERCENT),
        }
    }

    /// Terminal failure.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Error,
            message: message.into(),
            percent: None,
        }
    }

    /// Keep-alive with an empty message.
    pub fn heartbeat() -> Self {
        Self {
            kind: EventKind::Heartbeat,
            message: String::new(),
            percent: None,
        }
    }

    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn percent(&self) -> Option<u8> {
        self.percent
    }

    /// Whether this event ends a workflow (`success` or `error`).
    pub const fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::Success | EventKind::Error)
    }

    /// Serialize to the wire JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
