//! Windowed entity extraction.
//!
//! The document is tokenized once and cut into contiguous,
//! non-overlapping windows of at most `window_tokens` tokens. Each window
//! is recognized on its own and the resulting spans are shifted by the
//! window's starting character offset.
//!
//! A mention that straddles two windows is not stitched back together:
//! each half is whatever the recognizer makes of it in isolation.

use std::ops::Range;

use tracing::debug;

use pdx_core::{EntitySpan, ExtractError};

use crate::recognizer::EntityRecognizer;

/// One slice of the document handed to the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Token indices covered by this window.
    pub tokens: Range<usize>,
    /// Byte range of the window text: first token start to last token end.
    pub bytes: Range<usize>,
    /// Character offset of the window text in the document.
    pub char_start: usize,
}

/// Runs an [`EntityRecognizer`] over a document in bounded windows.
pub struct ChunkedExtractor<'r, R: EntityRecognizer + ?Sized> {
    recognizer: &'r R,
    window_tokens: usize,
}

impl<'r, R: EntityRecognizer + ?Sized> ChunkedExtractor<'r, R> {
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidWindow`] if `window_tokens` is zero.
    pub fn new(recognizer: &'r R, window_tokens: usize) -> Result<Self, ExtractError> {
        if window_tokens == 0 {
            return Err(ExtractError::InvalidWindow);
        }
        Ok(Self {
            recognizer,
            window_tokens,
        })
    }

    /// Partition `text` into windows.
    #[must_use]
    pub fn windows(&self, text: &str) -> Vec<Window> {
        let tokens = self.recognizer.tokenize(text);
        let mut windows = Vec::with_capacity(tokens.len().div_ceil(self.window_tokens));

        // Running (byte, char) position so char offsets are computed in one pass.
        let mut byte_pos = 0;
        let mut char_pos = 0;

        for (n, chunk) in tokens.chunks(self.window_tokens).enumerate() {
            let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
                continue;
            };
            char_pos += text[byte_pos..first.start].chars().count();
            byte_pos = first.start;

            let start = n * self.window_tokens;
            windows.push(Window {
                tokens: start..start + chunk.len(),
                bytes: first.start..last.end,
                char_start: char_pos,
            });
        }

        windows
    }

    /// Extract entity spans from a full document, in document order.
    ///
    /// # Errors
    ///
    /// Returns the recognizer's error for the first window that fails; no
    /// spans are returned in that case. Returns
    /// [`ExtractError::Recognition`] if the recognizer reports a span
    /// outside its window.
    pub fn extract(&self, text: &str) -> Result<Vec<EntitySpan>, ExtractError> {
        let mut spans = Vec::new();

        for window in self.windows(text) {
            let window_text = &text[window.bytes.clone()];
            let window_chars = window_text.chars().count();

            let mut local = self.recognizer.recognize(window_text)?;
            if let Some(bad) = local
                .iter()
                .find(|s| s.start_char > s.end_char || s.end_char > window_chars)
            {
                return Err(ExtractError::Recognition(format!(
                    "span '{}' ({}..{}) outside window of {window_chars} chars",
                    bad.text, bad.start_char, bad.end_char
                )));
            }
            local.sort_by_key(|s| s.start_char);

            debug!(
                tokens = ?window.tokens,
                char_start = window.char_start,
                spans = local.len(),
                "recognized window"
            );
            spans.extend(local.into_iter().map(|s| s.shifted(window.char_start)));
        }

        Ok(spans)
    }

    /// Join paragraphs with newlines and extract from the result.
    ///
    /// # Errors
    ///
    /// See [`extract`](Self::extract).
    pub fn extract_paragraphs<S: AsRef<str>>(
        &self,
        paragraphs: &[S],
    ) -> Result<Vec<EntitySpan>, ExtractError> {
        self.extract(&join_paragraphs(paragraphs))
    }
}

/// The full document text the extractor sees for a list of paragraphs.
#[must_use]
pub fn join_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::tokenizer::{char_offset, tokenize};
    use crate::Gazetteer;

    /// Labels every run of capitalized tokens as a PERSON and records the
    /// windows it was given.
    #[derive(Default)]
    struct CapitalizedRuns {
        seen: RefCell<Vec<String>>,
    }

    impl EntityRecognizer for CapitalizedRuns {
        fn recognize(&self, window: &str) -> Result<Vec<EntitySpan>, ExtractError> {
            self.seen.borrow_mut().push(window.to_string());
            let mut spans = Vec::new();
            let mut run: Option<Range<usize>> = None;
            let sentinel = window.len()..window.len();
            for token in tokenize(window).iter().chain(std::iter::once(&sentinel)) {
                let capitalized = window[token.clone()]
                    .chars()
                    .next()
                    .is_some_and(char::is_uppercase);
                if capitalized {
                    let start = run.as_ref().map_or(token.start, |r| r.start);
                    run = Some(start..token.end);
                } else if let Some(r) = run.take() {
                    spans.push(EntitySpan::new(
                        &window[r.clone()],
                        char_offset(window, r.start),
                        char_offset(window, r.end),
                        "PERSON",
                    ));
                }
            }
            Ok(spans)
        }
    }

    struct OutOfBounds;

    impl EntityRecognizer for OutOfBounds {
        fn recognize(&self, window: &str) -> Result<Vec<EntitySpan>, ExtractError> {
            let n = window.chars().count();
            Ok(vec![EntitySpan::new("ghost", n, n + 5, "PERSON")])
        }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn zero_window_is_rejected() {
        let recognizer = CapitalizedRuns::default();
        assert!(matches!(
            ChunkedExtractor::new(&recognizer, 0),
            Err(ExtractError::InvalidWindow)
        ));
    }

    #[test]
    fn exact_multiple_analyzes_every_window_once() {
        let recognizer = CapitalizedRuns::default();
        let extractor = ChunkedExtractor::new(&recognizer, 512).unwrap();
        let text = words(1024);

        let windows = extractor.windows(&text);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].tokens, 0..512);
        assert_eq!(windows[1].tokens, 512..1024);

        extractor.extract(&text).unwrap();
        let seen = recognizer.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("w0 ") && seen[0].ends_with(" w511"));
        assert!(seen[1].starts_with("w512 ") && seen[1].ends_with(" w1023"));
    }

    #[test]
    fn short_text_is_one_window_and_empty_text_none() {
        let recognizer = CapitalizedRuns::default();
        let extractor = ChunkedExtractor::new(&recognizer, 512).unwrap();
        assert_eq!(extractor.windows("just a few words").len(), 1);
        assert!(extractor.windows("").is_empty());
        assert!(extractor.extract("   ").unwrap().is_empty());
    }

    #[test]
    fn global_offsets_are_window_start_plus_local() {
        let recognizer = CapitalizedRuns::default();
        let extractor = ChunkedExtractor::new(&recognizer, 3).unwrap();
        // Windows: [Ålesund is far] [; Bo went] [there .]
        let text = "Ålesund is far; Bo went there.";
        let spans = extractor.extract(text).unwrap();

        let chars: Vec<char> = text.chars().collect();
        assert_eq!(spans.len(), 2);
        for span in &spans {
            let sliced: String = chars[span.start_char..span.end_char].iter().collect();
            assert_eq!(sliced, span.text);
        }
        assert_eq!(spans[0].start_char, 0);
        assert_eq!(spans[1].text, "Bo");
        assert_eq!(spans[1].start_char, 16);
    }

    #[test]
    fn mention_split_at_boundary_becomes_two_spans() {
        let recognizer = CapitalizedRuns::default();
        let extractor = ChunkedExtractor::new(&recognizer, 512).unwrap();

        let mut tokens: Vec<String> = (0..1024).map(|i| format!("w{i}")).collect();
        tokens[511] = "Fiona".to_string();
        tokens[512] = "Calvert".to_string();
        let text = tokens.join(" ");

        let spans = extractor.extract(&text).unwrap();
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Fiona", "Calvert"]);

        let fiona = text.find("Fiona").unwrap();
        let calvert = text.find("Calvert").unwrap();
        assert_eq!(spans[0].start_char, fiona);
        assert_eq!(spans[1].start_char, calvert);
        assert_eq!(spans[1].end_char, calvert + "Calvert".len());
    }

    #[test]
    fn repeated_mentions_across_windows_are_kept() {
        let gazetteer = Gazetteer::from_entries([("Acme", "ORG")]);
        let extractor = ChunkedExtractor::new(&gazetteer, 2).unwrap();
        let spans = extractor.extract("Acme builds . Acme sells").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].start_char, 14);
    }

    #[test]
    fn recognizer_failure_yields_no_spans() {
        let recognizer = crate::Unavailable::new("offline");
        let extractor = ChunkedExtractor::new(&recognizer, 4).unwrap();
        assert_eq!(
            extractor.extract("some text here"),
            Err(ExtractError::ModelUnavailable("offline".to_string()))
        );
    }

    #[test]
    fn out_of_window_span_is_rejected() {
        let extractor = ChunkedExtractor::new(&OutOfBounds, 4).unwrap();
        assert!(matches!(
            extractor.extract("a b c"),
            Err(ExtractError::Recognition(_))
        ));
    }

    #[test]
    fn paragraphs_are_joined_with_newlines() {
        let gazetteer = Gazetteer::from_entries([("Acme", "ORG")]);
        let extractor = ChunkedExtractor::new(&gazetteer, 512).unwrap();
        let spans = extractor
            .extract_paragraphs(&["First line.", "Acme second."])
            .unwrap();
        assert_eq!(spans, vec![EntitySpan::new("Acme", 12, 16, "ORG")]);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn windows_partition_tokens(
                words in prop::collection::vec("[a-zA-Zé]{1,6}", 0..60),
                window in 1usize..9,
            ) {
                let text = words.join(" ");
                let recognizer = CapitalizedRuns::default();
                let extractor = ChunkedExtractor::new(&recognizer, window).unwrap();
                let windows = extractor.windows(&text);

                let mut expected_start = 0;
                for w in &windows {
                    prop_assert_eq!(w.tokens.start, expected_start);
                    prop_assert!(w.tokens.len() <= window && !w.tokens.is_empty());
                    prop_assert_eq!(w.char_start, char_offset(&text, w.bytes.start));
                    expected_start = w.tokens.end;
                }
                prop_assert_eq!(expected_start, tokenize(&text).len());
            }

            #[test]
            fn span_offsets_index_the_document(
                words in prop::collection::vec("[A-Za-zÅé]{1,6}", 1..60),
                window in 1usize..9,
            ) {
                let text = words.join(" ");
                let chars: Vec<char> = text.chars().collect();
                let recognizer = CapitalizedRuns::default();
                let extractor = ChunkedExtractor::new(&recognizer, window).unwrap();

                let spans = extractor.extract(&text).unwrap();
                let mut last_start = 0;
                for span in &spans {
                    let sliced: String = chars[span.start_char..span.end_char].iter().collect();
                    prop_assert_eq!(&sliced, &span.text);
                    prop_assert!(span.start_char >= last_start);
                    last_start = span.start_char;
                }
            }
        }
    }
}
