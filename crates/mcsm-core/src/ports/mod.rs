//! Port definitions (trait abstractions) and domain error types.
//!
//! Ports keep the core independent of transports and I/O. Runtime and adapter
//! crates implement them.
//!
//! # Design Rules
//!
//! - No channel, socket or HTTP types in signatures
//! - Errors are semantic: callers match on variants, never on strings

mod artifact_source;
mod event_sink;

use std::path::PathBuf;

use thiserror::Error;

pub use artifact_source::{
    ArtifactSource, ArtifactSpec, LISTED_RELEASES, LISTED_SNAPSHOTS, SetupError, VersionInfo,
    VersionListing,
};
pub use event_sink::{EventSink, NoopEventSink, RecordingEventSink};

/// Errors returned by process supervisor operations.
///
/// Every lifecycle operation returns one of these to its immediate caller;
/// nothing escapes the supervisor as a panic.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A start was requested while the process already has a live handle.
    #[error("Server '{0}' is already running")]
    AlreadyRunning(String),

    /// The operation needs a live handle and there is none.
    #[error("Server '{0}' is not running")]
    NotRunning(String),

    /// No server is registered (or was ever started) under this name.
    #[error("Server '{0}' not found")]
    NotFound(String),

    /// The launch artifact (server jar) does not exist.
    #[error("Launch artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// The working directory is not writable.
    #[error("No write access to server directory: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// The input pipe closed under us; the process exited mid-write.
    #[error("Input pipe of server '{0}' is closed")]
    BrokenPipe(String),

    /// The executable could not be spawned.
    #[error("Failed to spawn server '{name}': {source}")]
    SpawnFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure while talking to the process.
    #[error("Process I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from binding a port-negotiating listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Every port in the retry window was already in use.
    #[error("No available port in range {first}-{last} after {attempts} attempts")]
    NoPortAvailable { first: u16, last: u16, attempts: u16 },

    /// Binding failed for a reason other than the port being in use.
    #[error("Failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}
