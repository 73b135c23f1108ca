//! The injected named-entity recognition capability.

use std::ops::Range;

use pdx_core::{EntitySpan, ExtractError};

use crate::tokenizer;

/// A named-entity recognizer with a bounded input window.
///
/// Implementations are handed one window of text at a time and return
/// spans whose offsets are character offsets *within that window*.
pub trait EntityRecognizer {
    /// Split text into tokens (byte ranges). The extractor windows on
    /// these, so a recognizer with its own tokenizer should override it.
    fn tokenize(&self, text: &str) -> Vec<Range<usize>> {
        tokenizer::tokenize(text)
    }

    /// Recognize entities in one window.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::ModelUnavailable`] if the underlying model
    /// cannot be used, or [`ExtractError::Recognition`] for a failure on
    /// this particular input.
    fn recognize(&self, window: &str) -> Result<Vec<EntitySpan>, ExtractError>;

    /// Free transient resources held between calls. Called once per paper.
    fn release(&self) {}
}

impl<R: EntityRecognizer + ?Sized> EntityRecognizer for Box<R> {
    fn tokenize(&self, text: &str) -> Vec<Range<usize>> {
        (**self).tokenize(text)
    }

    fn recognize(&self, window: &str) -> Result<Vec<EntitySpan>, ExtractError> {
        (**self).recognize(window)
    }

    fn release(&self) {
        (**self).release();
    }
}

/// Recognizer used when none could be loaded. Every call fails with
/// [`ExtractError::ModelUnavailable`], so papers that need extraction are
/// reported as failed while cached papers still ingest.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl EntityRecognizer for Unavailable {
    fn recognize(&self, _window: &str) -> Result<Vec<EntitySpan>, ExtractError> {
        Err(ExtractError::ModelUnavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_always_fails_with_reason() {
        let recognizer = Unavailable::new("no gazetteer configured");
        assert_eq!(
            recognizer.recognize("Fiona Calvert"),
            Err(ExtractError::ModelUnavailable(
                "no gazetteer configured".to_string()
            ))
        );
    }

    #[test]
    fn boxed_recognizer_delegates() {
        let boxed: Box<dyn EntityRecognizer> = Box::new(Unavailable::new("x"));
        assert!(boxed.recognize("text").is_err());
        assert_eq!(boxed.tokenize("two words").len(), 2);
    }
}
