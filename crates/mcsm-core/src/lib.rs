//! Core domain types and ports for the Minecraft server supervisor.
//!
//! This crate holds no process or network I/O. Runtime and adapter crates
//! depend on it; it depends on none of them.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

pub use domain::{
    DEFAULT_JAR_NAME, PROPERTIES_FILE, PropertiesError, ServerDefinition, ServerProperties,
    unique_name,
};
pub use events::{Event, EventKind};
pub use ports::{
    ArtifactSource, ArtifactSpec, EventSink, LISTED_RELEASES, LISTED_SNAPSHOTS, ListenerError,
    NoopEventSink, ProcessError, RecordingEventSink, SetupError, VersionInfo, VersionListing,
};
pub use settings::{
    DEFAULT_HTTP_PORT, DEFAULT_MAX_PORT_ATTEMPTS, DEFAULT_WS_PORT, Settings, SettingsError,
    load_definitions, save_definitions,
};
