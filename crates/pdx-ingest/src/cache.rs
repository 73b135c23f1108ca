//! On-disk artifact cache.
//!
//! An artifact that exists is trusted as-is. If the source text changes
//! after an entities artifact was written, the stale entities are kept
//! until the artifact is deleted by hand.

use std::path::Path;

use serde::{Deserialize, Serialize};

use pdx_core::error::PdxError;
use pdx_core::EntitiesArtifact;

/// On-disk shape of the structured-text snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub paper: String,
    pub paragraphs: Vec<String>,
}

/// Load a cached entities artifact, or `None` if there is none.
///
/// # Errors
///
/// Returns [`PdxError::Serialization`] if the file exists but is not a
/// valid artifact, and [`PdxError::Io`] if it cannot be read.
pub fn load_entities(path: &Path) -> Result<Option<EntitiesArtifact>, PdxError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    let artifact = serde_json::from_str(&raw)
        .map_err(|e| PdxError::Serialization(format!("{}: {e}", path.display())))?;
    Ok(Some(artifact))
}

/// Write an entities artifact, creating parent directories.
///
/// # Errors
///
/// Returns [`PdxError::Io`] if the file cannot be written.
pub fn store_entities(path: &Path, artifact: &EntitiesArtifact) -> Result<(), PdxError> {
    write_json(path, artifact)
}

/// Write the snapshot unless one already exists. Returns whether a file
/// was written.
///
/// # Errors
///
/// Returns [`PdxError::Io`] if the file cannot be written.
pub fn ensure_snapshot(path: &Path, snapshot: &Snapshot) -> Result<bool, PdxError> {
    if path.exists() {
        return Ok(false);
    }
    write_json(path, snapshot)?;
    Ok(true)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PdxError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json =
        serde_json::to_string(value).map_err(|e| PdxError::Serialization(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}
