//! Artifact source port: resolves a game version to a downloadable server jar.
//!
//! The version manifest and the download transport are external concerns.
//! The setup workflow only needs a URL, an expected checksum, and a way to
//! put the bytes on disk.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolved server artifact for one game version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    /// Concrete version id (e.g. `1.21.1`), never an alias like `latest`.
    pub version_id: String,
    /// Download URL of the server jar.
    pub url: String,
    /// Expected SHA-1 of the jar, lowercase hex. `None` skips verification.
    pub sha1: Option<String>,
}

/// How many releases a [`VersionListing`] carries.
pub const LISTED_RELEASES: usize = 20;

/// How many snapshots a [`VersionListing`] carries.
pub const LISTED_SNAPSHOTS: usize = 10;

/// One installable game version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub id: String,
    /// `release` or `snapshot` (older manifests also list `old_beta` etc.).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_time: Option<String>,
}

/// Newest versions per channel, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionListing {
    pub latest_release: String,
    pub latest_snapshot: String,
    /// At most [`LISTED_RELEASES`] entries.
    pub releases: Vec<VersionInfo>,
    /// At most [`LISTED_SNAPSHOTS`] entries.
    pub snapshots: Vec<VersionInfo>,
}

/// Failures of the setup workflow.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The downloaded jar does not match the manifest checksum.
    #[error("SHA1 mismatch for server.jar: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// The requested version could not be resolved.
    #[error("Failed to resolve version: {0}")]
    Resolve(String),

    /// The artifact download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of server artifacts.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Resolve `version` (`latest`, `snapshot` or an exact id).
    async fn resolve(&self, version: &str) -> Result<ArtifactSpec, SetupError>;

    /// Latest release and snapshot plus the newest entries of each channel.
    async fn versions(&self) -> Result<VersionListing, SetupError>;

    /// Download `url` to `dest`, replacing any existing file.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), SetupError>;
}
