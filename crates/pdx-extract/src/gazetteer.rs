//! List-backed entity recognizer.
//!
//! A gazetteer is a TOML file of known entity names:
//!
//! ```toml
//! [[entity]]
//! text = "Fiona Calvert"
//! label = "PERSON"
//!
//! [[entity]]
//! text = "Acme"
//! label = "ORG"
//! ```
//!
//! Matching is case-sensitive on whole tokens, longest entry first, and
//! never overlaps: once tokens are claimed by a match, scanning resumes
//! after them.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use pdx_core::{EntitySpan, ExtractError};

use crate::recognizer::EntityRecognizer;
use crate::tokenizer::{char_offset, tokenize};

#[derive(Debug, Deserialize)]
struct GazetteerFile {
    #[serde(default)]
    entity: Vec<GazetteerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct GazetteerEntry {
    text: String,
    label: String,
}

/// Token sequence of one entry plus its label.
#[derive(Debug, Clone)]
struct Pattern {
    tokens: Vec<String>,
    label: String,
}

/// Recognizer that finds occurrences of a fixed list of entity names.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    /// Patterns keyed by their first token, longest first.
    by_first_token: HashMap<String, Vec<Pattern>>,
    len: usize,
}

impl Gazetteer {
    /// Load a gazetteer file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::ModelUnavailable`] if the file is missing,
    /// unreadable, or not a valid gazetteer.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::ModelUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let file: GazetteerFile = toml::from_str(&raw).map_err(|e| {
            ExtractError::ModelUnavailable(format!("invalid gazetteer {}: {e}", path.display()))
        })?;

        let gazetteer = Self::from_entries(file.entity.into_iter().map(|e| (e.text, e.label)));
        info!(path = %path.display(), entries = gazetteer.len(), "loaded gazetteer");
        Ok(gazetteer)
    }

    /// Build a gazetteer from `(text, label)` pairs. Entries whose text has
    /// no tokens are ignored.
    pub fn from_entries<I, S, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, L)>,
        S: AsRef<str>,
        L: Into<String>,
    {
        let mut gazetteer = Self::default();
        for (text, label) in entries {
            let text = text.as_ref();
            let tokens: Vec<String> = tokenize(text)
                .into_iter()
                .map(|r| text[r].to_string())
                .collect();
            let Some(first) = tokens.first().cloned() else {
                continue;
            };
            gazetteer.by_first_token.entry(first).or_default().push(Pattern {
                tokens,
                label: label.into(),
            });
            gazetteer.len += 1;
        }
        for patterns in gazetteer.by_first_token.values_mut() {
            patterns.sort_by(|a, b| b.tokens.len().cmp(&a.tokens.len()));
        }
        gazetteer
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl EntityRecognizer for Gazetteer {
    fn recognize(&self, window: &str) -> Result<Vec<EntitySpan>, ExtractError> {
        let tokens = self.tokenize(window);
        let words: Vec<&str> = tokens.iter().map(|r| &window[r.clone()]).collect();
        let mut spans = Vec::new();
        let mut i = 0;

        while i < words.len() {
            let matched = self.by_first_token.get(words[i]).and_then(|patterns| {
                patterns.iter().find(|p| {
                    let end = i + p.tokens.len();
                    end <= words.len() && p.tokens.iter().zip(&words[i..end]).all(|(a, b)| a == b)
                })
            });

            if let Some(pattern) = matched {
                let start = tokens[i].start;
                let end = tokens[i + pattern.tokens.len() - 1].end;
                spans.push(EntitySpan::new(
                    &window[start..end],
                    char_offset(window, start),
                    char_offset(window, end),
                    pattern.label.clone(),
                ));
                i += pattern.tokens.len();
            } else {
                i += 1;
            }
        }

        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Gazetteer {
        Gazetteer::from_entries([
            ("Fiona Calvert", "PERSON"),
            ("Fiona", "PERSON"),
            ("Acme", "ORG"),
            ("The Tempest", "WORK_OF_ART"),
            ("   ", "IGNORED"),
        ])
    }

    #[test]
    fn ignores_entries_without_tokens() {
        assert_eq!(gazetteer().len(), 4);
    }

    #[test]
    fn finds_longest_match_with_char_offsets() {
        let text = "Café notes: Fiona Calvert joined Acme.";
        let spans = gazetteer().recognize(text).unwrap();

        assert_eq!(
            spans,
            vec![
                EntitySpan::new("Fiona Calvert", 12, 25, "PERSON"),
                EntitySpan::new("Acme", 33, 37, "ORG"),
            ]
        );
        let chars: Vec<char> = text.chars().collect();
        let sliced: String = chars[12..25].iter().collect();
        assert_eq!(sliced, "Fiona Calvert");
    }

    #[test]
    fn falls_back_to_shorter_entry() {
        let spans = gazetteer().recognize("Fiona wrote The Tempest notes").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Fiona");
        assert_eq!(spans[1].text, "The Tempest");
        assert_eq!(spans[1].label, "WORK_OF_ART");
    }

    #[test]
    fn matching_is_case_sensitive_and_whole_token() {
        let spans = gazetteer().recognize("acme Acmeville ACME").unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn repeated_mentions_are_all_reported() {
        let spans = gazetteer().recognize("Acme and Acme and Acme").unwrap();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].start_char, 18);
    }

    #[test]
    fn load_reads_toml_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gazetteer.toml");
        std::fs::write(
            &path,
            "[[entity]]\ntext = \"Jane Doe\"\nlabel = \"PERSON\"\n",
        )
        .unwrap();

        let gazetteer = Gazetteer::load(&path).unwrap();
        assert_eq!(gazetteer.len(), 1);
        let spans = gazetteer.recognize("ask Jane Doe").unwrap();
        assert_eq!(spans, vec![EntitySpan::new("Jane Doe", 4, 12, "PERSON")]);
    }

    #[test]
    fn load_missing_file_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = Gazetteer::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ExtractError::ModelUnavailable(_)));
    }

    #[test]
    fn load_invalid_file_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[[entity]]\ntext = 3\n").unwrap();
        assert!(matches!(
            Gazetteer::load(&path),
            Err(ExtractError::ModelUnavailable(_))
        ));
    }
}
