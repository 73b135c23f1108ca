//! Where paragraph text comes from.
//!
//! Converting PDFs or DOCX files to text is somebody else's job; the
//! pipeline only asks a [`DocumentSource`] for a paper's paragraphs.

use std::path::Path;

use tracing::debug;

use pdx_core::error::PdxError;
use pdx_core::Paper;

/// Supplies the paragraph text of a paper.
pub trait DocumentSource {
    /// # Errors
    ///
    /// Returns an error if the paper's text cannot be produced.
    fn paragraphs(&self, paper: &Paper) -> Result<Vec<String>, PdxError>;
}

/// Reads the paper's normalized document as UTF-8 text, one paragraph per
/// non-blank line.
///
/// If the normalized document does not exist yet but the source is itself
/// a plain-text file (`.txt`, `.md`), the source is copied into place
/// first. Any other source format must be converted beforehand.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDocuments;

impl TextDocuments {
    fn is_plain_text(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("md"))
    }
}

impl DocumentSource for TextDocuments {
    fn paragraphs(&self, paper: &Paper) -> Result<Vec<String>, PdxError> {
        let document = &paper.artifacts.document;
        let source = &paper.artifacts.source;

        if !document.exists() {
            if !(Self::is_plain_text(source) && source.is_file()) {
                return Err(PdxError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!(
                        "no normalized document at {} (convert {} first)",
                        document.display(),
                        source.display()
                    ),
                )));
            }
            if let Some(parent) = document.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(source, document)?;
            debug!(paper = %paper.name, from = %source.display(), "copied plain-text source");
        }

        let text = std::fs::read_to_string(document)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
