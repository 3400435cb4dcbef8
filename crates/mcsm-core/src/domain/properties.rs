//! `server.properties` parsing and serialization.
//!
//! Format: one `key=value` per line, `#` comments and blank lines ignored.
//! On read the first occurrence of a key wins; on write the last one does.

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// File name inside a server directory.
pub const PROPERTIES_FILE: &str = "server.properties";

#[derive(Debug, Error)]
pub enum PropertiesError {
    #[error("Properties file not found: {0}")]
    NotFound(String),

    #[error("Failed to access properties file: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered key/value view of a `server.properties` file.
///
/// Serializes as a JSON object in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerProperties {
    entries: Vec<(String, String)>,
}

impl ServerProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse file contents. Lines without `=` are skipped.
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if props.get(key).is_none() {
                props
                    .entries
                    .push((key.to_string(), value.trim().to_string()));
            }
        }
        props
    }

    /// Build from pairs; a repeated key keeps its first position and last value.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut props = Self::new();
        for (key, value) in pairs {
            props.set(key, value);
        }
        props
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read `dir/server.properties`.
    pub fn load(dir: &Path) -> Result<Self, PropertiesError> {
        let path = dir.join(PROPERTIES_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PropertiesError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write `dir/server.properties`, creating `dir` if needed.
    pub fn save(&self, dir: &Path) -> Result<(), PropertiesError> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(PROPERTIES_FILE), self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for ServerProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

impl Serialize for ServerProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for ServerProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = ServerProperties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut props = ServerProperties::new();
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    props.set(key, value);
                }
                Ok(props)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}
