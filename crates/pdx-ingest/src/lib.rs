//! # pdx-ingest
//!
//! Batch ingestion for paperdex: turns a list of papers into rows of the
//! paper/entity graph.
//!
//! Per paper, the pipeline:
//! 1. cleans and NFKC-normalizes the paragraph text, then writes the structured-text snapshot if it is not cached yet
//! 2. loads the cached entities artifact, or extracts entities in
//!    bounded windows and caches the result
//! 3. upserts the paper, each entity, and each paper/entity link
//!
//! A paper that fails is logged and reported; the rest of the batch
//! continues and the whole batch commits once at the end.

pub mod cache;
pub mod clean;
pub mod jobs;
pub mod pipeline;
pub mod source;

pub use clean::{clean_paragraphs, clean_text, normalize_text};
pub use jobs::load_job_index;
pub use pipeline::{FailedPaper, IngestReport, Ingestor, PaperOutcome};
pub use source::{DocumentSource, TextDocuments};
