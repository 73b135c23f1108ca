//! Paper type: the business identity of an ingested document.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A paper to ingest: its unique name and where its artifacts live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Unique business key.
    pub name: String,
    pub artifacts: ArtifactPaths,
}

/// The four artifact locations derived for every paper.
///
/// They are opaque cache locations: only the entities artifact is ever
/// parsed by the ingestion path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Original source document (e.g. the PDF).
    pub source: PathBuf,
    /// Normalized plain-text document.
    pub document: PathBuf,
    /// Structured-text snapshot (paragraph JSON).
    pub snapshot: PathBuf,
    /// Cached entity extraction result.
    pub entities: PathBuf,
}

impl Paper {
    #[must_use]
    pub fn new(name: impl Into<String>, artifacts: ArtifactPaths) -> Self {
        Self {
            name: name.into(),
            artifacts,
        }
    }
}
