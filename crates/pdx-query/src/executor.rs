//! Query executor: runs compiled queries against the graph store.

use std::collections::HashSet;

use rusqlite::types::Value as SqlValue;
use tracing::debug;

use pdx_core::error::PdxError;
use pdx_store::{GraphStore, PaperRecord};

use crate::compiler::{compile_sentence, CompiledQuery};

/// Execute a compiled query.
///
/// The join yields one row per matching link, so a paper that matches
/// through several entities would appear several times; rows are
/// collapsed to the first occurrence of each paper. An empty result is
/// not an error.
///
/// # Errors
///
/// Returns [`PdxError::Store`] if execution fails.
pub fn execute(store: &GraphStore, compiled: &CompiledQuery) -> Result<Vec<PaperRecord>, PdxError> {
    let params: Vec<SqlValue> = compiled
        .params
        .iter()
        .map(|p| SqlValue::Text(p.clone()))
        .collect();

    let rows = store.query_papers(&compiled.sql, &params)?;
    let fetched = rows.len();

    let mut seen = HashSet::new();
    let papers: Vec<PaperRecord> = rows
        .into_iter()
        .filter(|row| seen.insert(row.paper_id))
        .collect();

    debug!(fetched, papers = papers.len(), "query executed");
    Ok(papers)
}

/// Parse, compile, and execute a query sentence.
///
/// # Errors
///
/// Returns [`PdxError::Query`] for an invalid sentence (nothing is
/// executed) and [`PdxError::Store`] if execution fails.
pub fn run_sentence(store: &GraphStore, sentence: &str) -> Result<Vec<PaperRecord>, PdxError> {
    let compiled = compile_sentence(sentence)?;
    debug!(sql = compiled.to_sql_text(), "compiled query");
    execute(store, &compiled)
}
