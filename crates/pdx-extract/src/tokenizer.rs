//! Word-boundary tokenizer.
//!
//! Tokens follow Unicode word boundaries (UAX #29) with whitespace
//! dropped, so punctuation becomes its own token and `O'Brien` stays
//! whole.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

/// Split `text` into tokens, returned as byte ranges into `text`.
#[must_use]
pub fn tokenize(text: &str) -> Vec<Range<usize>> {
    text.split_word_bound_indices()
        .filter(|(_, segment)| !segment.chars().all(char::is_whitespace))
        .map(|(start, segment)| start..start + segment.len())
        .collect()
}

/// Number of chars in `text[..byte]`.
pub(crate) fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}
