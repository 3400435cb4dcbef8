//! `mcsm properties`.

use std::path::Path;

use anyhow::Result;
use mcsm_core::{PropertiesError, ServerProperties};

/// Apply `updates` (if any) and return the resulting properties.
///
/// Reading requires the file to exist; setting creates it.
pub fn apply(dir: &Path, updates: Vec<(String, String)>) -> Result<ServerProperties> {
    if updates.is_empty() {
        return Ok(ServerProperties::load(dir)?);
    }

    let mut properties = match ServerProperties::load(dir) {
        Ok(properties) => properties,
        Err(PropertiesError::NotFound(_)) => ServerProperties::new(),
        Err(e) => return Err(e.into()),
    };
    for (key, value) in updates {
        properties.set(key, value);
    }
    properties.save(dir)?;
    Ok(properties)
}

pub fn execute(dir: &Path, updates: Vec<(String, String)>) -> Result<()> {
    let properties = apply(dir, updates)?;
    print!("{properties}");
    Ok(())
}
