//! # pdx-query
//!
//! Query engine for paperdex. Compiles a parsed query sentence into SQL
//! over the paper/entity graph and runs it.
//!
//! Includes:
//! - sentence-to-SQL compiler (parameterized and literal text forms)
//! - executor over [`pdx_store::GraphStore`]
//! - result formatter (table, JSON)

pub mod compiler;
pub mod executor;
pub mod formatter;

pub use compiler::{compile, compile_sentence, escape_literal, CompiledQuery};
pub use executor::{execute, run_sentence};
pub use formatter::{format_mentions, format_papers, OutputFormat, NO_RESULTS};
