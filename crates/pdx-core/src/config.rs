//! `paperdex.toml` configuration.
//!
//! Every field has a default, so a missing file or a partial file is
//! valid:
//!
//! ```toml
//! database = "data/paperdex.sqlite"
//! source_dir = "Papers"
//! docs_dir = "Docs"
//! json_dir = "JSON"
//! entities_dir = "Ents"
//! window_tokens = 512
//! history = "data/history.txt"
//! gazetteer = "gazetteer.toml"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PdxError;
use crate::paper::{ArtifactPaths, Paper};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE: &str = "paperdex.toml";

/// Default extraction window, in tokens.
pub const DEFAULT_WINDOW_TOKENS: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file.
    pub database: PathBuf,
    /// Directory holding the original source documents.
    pub source_dir: PathBuf,
    /// Directory for normalized plain-text documents.
    pub docs_dir: PathBuf,
    /// Directory for structured-text snapshots.
    pub json_dir: PathBuf,
    /// Directory for cached entity extraction results.
    pub entities_dir: PathBuf,
    /// Maximum tokens handed to the recognizer per call.
    pub window_tokens: usize,
    /// Line history of the interactive query shell.
    pub history: PathBuf,
    /// Entity list for the built-in gazetteer recognizer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gazetteer: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/paperdex.sqlite"),
            source_dir: PathBuf::from("Papers"),
            docs_dir: PathBuf::from("Docs"),
            json_dir: PathBuf::from("JSON"),
            entities_dir: PathBuf::from("Ents"),
            window_tokens: DEFAULT_WINDOW_TOKENS,
            history: PathBuf::from("data/history.txt"),
            gazetteer: None,
        }
    }
}

impl Config {
    /// Load a config file.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Io`] if the file cannot be read and
    /// [`PdxError::Config`] if it is not valid TOML or fails validation.
    pub fn load(path: &Path) -> Result<Self, PdxError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| PdxError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else `paperdex.toml` from `dir` if it
    /// exists, else the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be loaded.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, PdxError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Config`] if `window_tokens` is zero.
    pub fn validate(&self) -> Result<(), PdxError> {
        if self.window_tokens == 0 {
            return Err(PdxError::Config(
                "window_tokens must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Derive a paper's artifact paths from its source file name.
    #[must_use]
    pub fn paper(&self, name: &str, file: &str) -> Paper {
        Paper::new(
            name,
            ArtifactPaths {
                source: self.source_dir.join(file),
                document: self.docs_dir.join(format!("{file}.txt")),
                snapshot: self.json_dir.join(format!("{file}.json")),
                entities: self.entities_dir.join(format!("{file}.json")),
            },
        )
    }

    /// Resolve every relative path against `base`.
    #[must_use]
    pub fn rooted_at(mut self, base: &Path) -> Self {
        let root = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        root(&mut self.database);
        root(&mut self.source_dir);
        root(&mut self.docs_dir);
        root(&mut self.json_dir);
        root(&mut self.entities_dir);
        root(&mut self.history);
        if let Some(g) = self.gazetteer.as_mut() {
            root(g);
        }
        self
    }

    /// Directories the pipeline writes artifacts into.
    #[must_use]
    pub fn artifact_dirs(&self) -> [&Path; 3] {
        [
            self.docs_dir.as_path(),
            self.json_dir.as_path(),
            self.entities_dir.as_path(),
        ]
    }
}
