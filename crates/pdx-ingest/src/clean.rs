//! Text cleaning applied to paragraphs before they are snapshotted or
//! handed to the recognizer.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// A blank line run, possibly holding whitespace.
static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Runs of spaces and tabs.
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Trim, unify line endings, squeeze blank line runs to one empty line and
/// space/tab runs to one space.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let text = text.trim().replace("\r\n", "\n").replace('\r', "\n");
    let text = BLANK_LINES_RE.replace_all(&text, "\n\n");
    SPACES_RE.replace_all(&text, " ").into_owned()
}

/// NFKC: full-width forms become ASCII, compatibility spaces become plain
/// spaces, ligatures are split.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.nfkc().collect()
}

/// Clean then normalize every paragraph. Paragraphs left empty are dropped.
#[must_use]
pub fn clean_paragraphs(paragraphs: Vec<String>) -> Vec<String> {
    paragraphs
        .into_iter()
        .map(|p| normalize_text(&clean_text(&p)).trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
