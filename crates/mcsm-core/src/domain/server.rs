//! Server definition: the persisted identity of a managed game server.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Jar file name used when a definition does not name one.
pub const DEFAULT_JAR_NAME: &str = "server.jar";

/// Everything needed to launch one Java game-server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDefinition {
    /// Unique name within the registry. May be omitted where a URL names
    /// the server.
    #[serde(default)]
    pub name: String,
    /// Working directory of the process.
    pub directory: PathBuf,
    /// Requested game version (`latest`, `snapshot` or an exact id).
    #[serde(default = "default_version")]
    pub version: String,
    /// JVM initial heap (`-Xms`).
    #[serde(default = "default_min_memory")]
    pub min_memory: String,
    /// JVM maximum heap (`-Xmx`).
    #[serde(default = "default_max_memory")]
    pub max_memory: String,
    /// Pass `nogui` to the server.
    #[serde(default = "default_nogui")]
    pub nogui: bool,
    /// Whether the EULA was accepted during setup.
    #[serde(default)]
    pub eula_accepted: bool,
    /// Jar path relative to `directory`; defaults to `server.jar`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar: Option<PathBuf>,
}

fn default_version() -> String {
    "latest".to_string()
}

fn default_min_memory() -> String {
    "1G".to_string()
}

fn default_max_memory() -> String {
    "2G".to_string()
}

const fn default_nogui() -> bool {
    true
}

impl ServerDefinition {
    /// Create a definition with default memory and version settings.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            version: default_version(),
            min_memory: default_min_memory(),
            max_memory: default_max_memory(),
            nogui: default_nogui(),
            eula_accepted: false,
            jar: None,
        }
    }

    /// Set heap sizes.
    #[must_use]
    pub fn with_memory(mut self, min: impl Into<String>, max: impl Into<String>) -> Self {
        self.min_memory = min.into();
        self.max_memory = max.into();
        self
    }

    /// Use a jar other than `server.jar`.
    #[must_use]
    pub fn with_jar(mut self, jar: impl Into<PathBuf>) -> Self {
        self.jar = Some(jar.into());
        self
    }

    /// Absolute (or directory-relative) path of the jar to launch.
    pub fn jar_path(&self) -> PathBuf {
        let jar = self
            .jar
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_JAR_NAME));
        self.directory.join(jar)
    }

    /// Arguments passed to the Java executable.
    pub fn launch_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            format!("-Xms{}", self.min_memory).into(),
            format!("-Xmx{}", self.max_memory).into(),
            "-jar".into(),
            self.jar_path().into_os_string(),
        ];
        if self.nogui {
            args.push("nogui".into());
        }
        args
    }
}

/// Pick a name not already present in `existing`, suffixing `_2`, `_3`, ...
pub fn unique_name<'a>(base: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let taken: std::collections::HashSet<&str> = existing.into_iter().collect();
    let base = if base.is_empty() { "server" } else { base };
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|idx| format!("{base}_{idx}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_args() {
        let def = ServerDefinition::new("survival1", "/srv/mc").with_memory("2G", "4G");
        let args: Vec<String> = def
            .launch_args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["-Xms2G", "-Xmx4G", "-jar", "/srv/mc/server.jar", "nogui"]
        );
    }

    #[test]
    fn test_launch_args_without_nogui() {
        let mut def = ServerDefinition::new("creative", "/srv/c");
        def.nogui = false;
        assert_eq!(def.launch_args().len(), 4);
    }

    #[test]
    fn test_custom_jar() {
        let def = ServerDefinition::new("modded", "/srv/m").with_jar("paper.jar");
        assert_eq!(def.jar_path(), PathBuf::from("/srv/m/paper.jar"));
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let def: ServerDefinition =
            serde_json::from_str(r#"{"name":"a","directory":"/tmp/a"}"#).unwrap();
        assert_eq!(def.version, "latest");
        assert_eq!(def.min_memory, "1G");
        assert_eq!(def.max_memory, "2G");
        assert!(def.nogui);
        assert!(!def.eula_accepted);
    }

    #[test]
    fn test_unique_name() {
        let existing = ["server", "server_2"];
        assert_eq!(unique_name("server", existing), "server_3");
        assert_eq!(unique_name("fresh", existing), "fresh");
        assert_eq!(unique_name("", ["x"]), "server");
    }
}
