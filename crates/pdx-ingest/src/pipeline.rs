//! Batch ingestion.
//!
//! A batch runs inside one store transaction. Each paper's graph writes
//! run inside a savepoint, so a paper that fails halfway leaves nothing
//! behind while the papers before it stay in the batch.
//!
//! A paper already in the store whose entities artifact is cached has
//! been linked before: only its artifact paths are refreshed, so link
//! counts do not grow on re-runs.

use serde::Serialize;
use tracing::{debug, info, warn};

use pdx_core::error::PdxError;
use pdx_core::{EntitiesArtifact, Paper};
use pdx_extract::{ChunkedExtractor, EntityRecognizer};
use pdx_store::GraphStore;

use crate::cache::{self, Snapshot};
use crate::clean::clean_paragraphs;
use crate::source::DocumentSource;

/// What happened to one successfully ingested paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperOutcome {
    pub name: String,
    pub paper_id: i64,
    /// Spans in the entities artifact.
    pub spans: usize,
    /// The entities artifact was read from cache.
    pub cached: bool,
    /// Links were written for this paper in this run.
    pub linked: bool,
}

/// A paper that could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedPaper {
    pub name: String,
    pub error: String,
}

/// Result of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub processed: Vec<PaperOutcome>,
    pub failed: Vec<FailedPaper>,
}

impl IngestReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives papers through snapshot, extraction, and graph writes.
pub struct Ingestor<'a> {
    store: &'a GraphStore,
    source: &'a dyn DocumentSource,
    recognizer: &'a dyn EntityRecognizer,
    window_tokens: usize,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        store: &'a GraphStore,
        source: &'a dyn DocumentSource,
        recognizer: &'a dyn EntityRecognizer,
        window_tokens: usize,
    ) -> Self {
        Self {
            store,
            source,
            recognizer,
            window_tokens,
        }
    }

    /// Ingest `papers` in order as one batch.
    ///
    /// Per-paper failures are logged and collected in the report; they
    /// never abort the batch.
    ///
    /// # Errors
    ///
    /// Returns [`PdxError::Extract`] if the window size is zero, and
    /// [`PdxError::Store`] if the batch transaction cannot be opened or
    /// committed.
    pub fn run(&self, papers: &[Paper]) -> Result<IngestReport, PdxError> {
        let extractor = ChunkedExtractor::new(self.recognizer, self.window_tokens)?;
        let mut report = IngestReport::default();

        self.store.begin_batch()?;
        for paper in papers {
            match self.ingest_one(&extractor, paper) {
                Ok(outcome) => {
                    info!(
                        paper = %outcome.name,
                        paper_id = outcome.paper_id,
                        spans = outcome.spans,
                        cached = outcome.cached,
                        linked = outcome.linked,
                        "ingested paper"
                    );
                    report.processed.push(outcome);
                }
                Err(e) => {
                    warn!(paper = %paper.name, error = %e, "failed to ingest paper");
                    report.failed.push(FailedPaper {
                        name: paper.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        self.store.commit_batch()?;

        info!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            "batch committed"
        );
        Ok(report)
    }

    fn paragraphs(&self, paper: &Paper) -> Result<Vec<String>, PdxError> {
        Ok(clean_paragraphs(self.source.paragraphs(paper)?))
    }

    fn ingest_one(
        &self,
        extractor: &ChunkedExtractor<'_, dyn EntityRecognizer + 'a>,
        paper: &Paper,
    ) -> Result<PaperOutcome, PdxError> {
        let artifacts = &paper.artifacts;

        let mut paragraphs = None;
        if !artifacts.snapshot.exists() {
            let snapshot = Snapshot {
                paper: paper.name.clone(),
                paragraphs: self.paragraphs(paper)?,
            };
            cache::ensure_snapshot(&artifacts.snapshot, &snapshot)?;
            debug!(paper = %paper.name, path = %artifacts.snapshot.display(), "wrote snapshot");
            paragraphs = Some(snapshot.paragraphs);
        }

        let (artifact, cached) = match cache::load_entities(&artifacts.entities)? {
            Some(artifact) => {
                debug!(paper = %paper.name, "entities artifact cached, skipping extraction");
                (artifact, true)
            }
            None => {
                let paragraphs = match paragraphs {
                    Some(p) => p,
                    None => self.paragraphs(paper)?,
                };
                let extracted = extractor.extract_paragraphs(&paragraphs);
                self.recognizer.release();
                let artifact = EntitiesArtifact {
                    entities: extracted?,
                };
                cache::store_entities(&artifacts.entities, &artifact)?;
                (artifact, false)
            }
        };

        let (paper_id, linked) = self.store.savepoint(|store| {
            let existed = store.paper_by_name(&paper.name)?.is_some();
            let paper_id = store.upsert_paper(paper)?;
            if existed && cached {
                return Ok((paper_id, false));
            }
            for span in &artifact.entities {
                let entity_id = store.upsert_entity(&span.text, &span.label)?;
                store.link_paper_entity(paper_id, entity_id)?;
            }
            Ok((paper_id, true))
        })?;

        Ok(PaperOutcome {
            name: paper.name.clone(),
            paper_id,
            spans: artifact.entities.len(),
            cached,
            linked,
        })
    }
}
