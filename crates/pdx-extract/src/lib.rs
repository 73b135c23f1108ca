//! # pdx-extract
//!
//! Named-entity extraction for paperdex.
//!
//! The recognizer itself is an injected capability ([`EntityRecognizer`]);
//! this crate owns the parts around it:
//! - [`tokenize`]: word-boundary tokenization into byte ranges
//! - [`ChunkedExtractor`]: splits a document into bounded token windows,
//!   runs the recognizer per window, and maps spans back to document
//!   offsets
//! - [`Gazetteer`]: a list-backed recognizer loaded from TOML
//! - [`Unavailable`]: stands in when no recognizer could be loaded

pub mod extractor;
pub mod gazetteer;
pub mod recognizer;
pub mod tokenizer;

pub use extractor::{join_paragraphs, ChunkedExtractor, Window};
pub use gazetteer::Gazetteer;
pub use recognizer::{EntityRecognizer, Unavailable};
pub use tokenizer::tokenize;
