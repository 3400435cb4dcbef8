//! Mojang piston-meta artifact source.
//!
//! Version aliases: `latest` / `release` resolve to the newest release,
//! `snapshot` to the newest snapshot; anything else must be an exact id.

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use mcsm_core::{
    ArtifactSource, ArtifactSpec, LISTED_RELEASES, LISTED_SNAPSHOTS, SetupError, VersionInfo,
    VersionListing,
};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Public version manifest.
pub const PISTON_META_MANIFEST: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

#[derive(Debug, Deserialize)]
struct VersionManifest {
    latest: LatestVersions,
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct LatestVersions {
    release: String,
    snapshot: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionEntry {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    url: String,
    #[serde(default)]
    release_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionDetails {
    downloads: VersionDownloads,
}

#[derive(Debug, Deserialize)]
struct VersionDownloads {
    server: Option<DownloadInfo>,
}

#[derive(Debug, Deserialize)]
struct DownloadInfo {
    url: String,
    sha1: Option<String>,
}

/// [`ArtifactSource`] backed by Mojang's launcher metadata.
#[derive(Debug, Clone)]
pub struct PistonArtifactSource {
    client: reqwest::Client,
    manifest_url: String,
}

impl PistonArtifactSource {
    pub fn new() -> Self {
        Self::with_manifest_url(PISTON_META_MANIFEST)
    }

    /// Use a different manifest location (mirrors, tests).
    pub fn with_manifest_url(manifest_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            manifest_url: manifest_url.into(),
        }
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, SetupError> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SetupError::Resolve(e.to_string()))?
            .json::<T>()
            .await
            .map_err(|e| SetupError::Resolve(format!("Invalid metadata from {url}: {e}")))
    }
}

impl Default for PistonArtifactSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the manifest entry for a requested version or alias.
fn select_version<'a>(
    manifest: &'a VersionManifest,
    requested: &str,
) -> Result<&'a VersionEntry, SetupError> {
    let id = match requested {
        "latest" | "release" => manifest.latest.release.as_str(),
        "snapshot" => manifest.latest.snapshot.as_str(),
        exact => exact,
    };
    manifest
        .versions
        .iter()
        .find(|entry| entry.id == id)
        .ok_or_else(|| SetupError::Resolve(format!("Version {id} not found in manifest")))
}

/// Newest entries per channel. The manifest lists newest first.
fn listing(manifest: &VersionManifest) -> VersionListing {
    let channel = |kind: &str, limit: usize| -> Vec<VersionInfo> {
        manifest
            .versions
            .iter()
            .filter(|entry| entry.kind == kind)
            .take(limit)
            .map(|entry| VersionInfo {
                id: entry.id.clone(),
                kind: entry.kind.clone(),
                release_time: entry.release_time.clone(),
            })
            .collect()
    };
    VersionListing {
        latest_release: manifest.latest.release.clone(),
        latest_snapshot: manifest.latest.snapshot.clone(),
        releases: channel("release", LISTED_RELEASES),
        snapshots: channel("snapshot", LISTED_SNAPSHOTS),
    }
}

#[async_trait]
impl ArtifactSource for PistonArtifactSource {
    async fn resolve(&self, version: &str) -> Result<ArtifactSpec, SetupError> {
        let manifest: VersionManifest = self.fetch_json(&self.manifest_url).await?;
        let entry = select_version(&manifest, version)?;
        debug!(requested = %version, id = %entry.id, "Resolved version");

        let details: VersionDetails = self.fetch_json(&entry.url).await?;
        let server = details.downloads.server.ok_or_else(|| {
            SetupError::Resolve(format!("No server download for version {}", entry.id))
        })?;
        Ok(ArtifactSpec {
            version_id: entry.id.clone(),
            url: server.url,
            sha1: server.sha1,
        })
    }

    async fn versions(&self) -> Result<VersionListing, SetupError> {
        let manifest: VersionManifest = self.fetch_json(&self.manifest_url).await?;
        Ok(listing(&manifest))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), SetupError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SetupError::Download(e.to_string()))?;

        // dest only appears once the body is complete
        let partial = dest.with_extension("jar.part");
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&partial).await;
                    return Err(SetupError::Download(e.to_string()));
                }
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&partial, dest).await?;

        debug!(url = %url, dest = %dest.display(), bytes = written, "Download complete");
        Ok(())
    }
}
