//! Job index: the list of papers to ingest.
//!
//! A TOML index lists one `[[paper]]` table per job:
//!
//! ```toml
//! [[paper]]
//! name = "Calvert 2021"
//! file = "calvert2021.pdf"
//! ```
//!
//! An `.xlsx` index is read from its `Sheet1`. The first row is a header
//! naming the `paper_name` and `paper_pdf` columns; every later row is a
//! job.
//!
//! Artifact paths are derived from `file` by [`Config::paper`].

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx};
use serde::Deserialize;
use tracing::{info, warn};

use pdx_core::error::PdxError;
use pdx_core::{Config, Paper};

use crate::clean::clean_text;

/// Worksheet read from spreadsheet indexes.
pub const SHEET: &str = "Sheet1";
/// Header of the paper name column.
pub const NAME_COLUMN: &str = "paper_name";
/// Header of the source file column.
pub const FILE_COLUMN: &str = "paper_pdf";

#[derive(Debug, Deserialize)]
struct JobIndex {
    #[serde(default)]
    paper: Vec<JobRow>,
}

#[derive(Debug, Deserialize)]
struct JobRow {
    name: String,
    file: String,
}

/// Load the job index at `path` and derive each paper's artifact paths.
///
/// Files ending in `.xlsx` are read as spreadsheets, anything else as
/// TOML. Rows with a blank name or file are skipped with a warning. A name
/// that appears twice is kept twice: the later row's paths win in the
/// store.
///
/// # Errors
///
/// Returns [`PdxError::Io`] if a TOML file cannot be read and
/// [`PdxError::Config`] if the file is not a valid index.
pub fn load_job_index(path: &Path, config: &Config) -> Result<Vec<Paper>, PdxError> {
    let rows = if is_spreadsheet(path) {
        read_sheet(path)?
    } else {
        read_toml(path)?
    };

    let mut seen = HashSet::new();
    let mut papers = Vec::with_capacity(rows.len());
    for (row_no, row) in rows.into_iter().enumerate() {
        let name = row.name.trim();
        let file = row.file.trim();
        if name.is_empty() || file.is_empty() {
            warn!(row = row_no + 1, "skipping index row with blank name or file");
            continue;
        }
        if !seen.insert(name.to_string()) {
            warn!(paper = name, "paper listed more than once in index");
        }
        papers.push(config.paper(name, file));
    }

    info!(path = %path.display(), papers = papers.len(), "loaded job index");
    Ok(papers)
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"))
}

fn read_toml(path: &Path) -> Result<Vec<JobRow>, PdxError> {
    let raw = std::fs::read_to_string(path)?;
    let index: JobIndex = toml::from_str(&raw)
        .map_err(|e| PdxError::Config(format!("{}: {e}", path.display())))?;
    Ok(index.paper)
}

fn read_sheet(path: &Path) -> Result<Vec<JobRow>, PdxError> {
    let config_err = |e: calamine::XlsxError| PdxError::Config(format!("{}: {e}", path.display()));
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(config_err)?;
    let range = workbook.worksheet_range(SHEET).map_err(config_err)?;
    let cells = range
        .rows()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();
    rows_from_cells(cells).map_err(|e| PdxError::Config(format!("{}: {e}", path.display())))
}

/// Map spreadsheet cells to job rows using the header in the first row.
/// Cells are cleaned the same way paragraph text is.
fn rows_from_cells(cells: Vec<Vec<String>>) -> Result<Vec<JobRow>, String> {
    let mut rows = cells.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let column = |wanted: &str| {
        header
            .iter()
            .position(|h| h.trim() == wanted)
            .ok_or_else(|| format!("{SHEET} has no `{wanted}` column"))
    };
    let name_col = column(NAME_COLUMN)?;
    let file_col = column(FILE_COLUMN)?;

    let cell = |row: &[String], col: usize| row.get(col).map(|c| clean_text(c)).unwrap_or_default();
    Ok(rows
        .map(|row| JobRow {
            name: cell(&row, name_col),
            file: cell(&row, file_col),
        })
        .collect())
}
