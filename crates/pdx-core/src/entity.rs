//! Entity types: extraction spans, the cached entities artifact, and the
//! categories the query language can name.

use serde::{Deserialize, Serialize};

/// A single recognized mention of a named entity.
///
/// Offsets are character (not byte) offsets into the full document text,
/// `start_char` inclusive and `end_char` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
    /// Category code as emitted by the recognizer (e.g. `PERSON`, `ORG`).
    pub label: String,
}

impl EntitySpan {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        start_char: usize,
        end_char: usize,
        label: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            start_char,
            end_char,
            label: label.into(),
        }
    }

    /// Shift the span by `offset` characters.
    #[must_use]
    pub fn shifted(mut self, offset: usize) -> Self {
        self.start_char += offset;
        self.end_char += offset;
        self
    }
}

/// On-disk shape of a paper's cached extraction result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitiesArtifact {
    pub entities: Vec<EntitySpan>,
}

/// Entity categories addressable from a query sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Person,
    Organisation,
    WorkOfArt,
}

impl EntityKind {
    /// All kinds, in keyword order.
    pub const ALL: [Self; 3] = [Self::Person, Self::Organisation, Self::WorkOfArt];

    /// The category code stored in `entities.entity_type`.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Organisation => "ORG",
            Self::WorkOfArt => "WORK_OF_ART",
        }
    }

    /// The query-language keyword for this kind.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organisation => "organisation",
            Self::WorkOfArt => "work",
        }
    }

    /// Case-insensitive keyword lookup.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(word))
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_map_to_stored_codes() {
        let code = |word: &str| EntityKind::from_keyword(word).map(EntityKind::code);
        assert_eq!(code("person"), Some("PERSON"));
        assert_eq!(code("Organisation"), Some("ORG"));
        assert_eq!(code("WORK"), Some("WORK_OF_ART"));
        assert_eq!(EntityKind::from_keyword("organization"), None);
    }

    #[test]
    fn display_is_the_stored_code() {
        let codes: Vec<String> = EntityKind::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(codes, vec!["PERSON", "ORG", "WORK_OF_ART"]);
    }

    #[test]
    fn artifact_uses_on_disk_field_names() {
        let artifact = EntitiesArtifact {
            entities: vec![EntitySpan::new("Fiona Calvert", 10, 23, "PERSON")],
        };
        let json = serde_json::to_value(&artifact).expect("serialize");
        assert_eq!(json["entities"][0]["text"], "Fiona Calvert");
        assert_eq!(json["entities"][0]["start_char"], 10);
        assert_eq!(json["entities"][0]["end_char"], 23);
        assert_eq!(json["entities"][0]["label"], "PERSON");
    }

    #[test]
    fn shifted_moves_both_offsets() {
        let span = EntitySpan::new("Acme", 3, 7, "ORG").shifted(100);
        assert_eq!((span.start_char, span.end_char), (103, 107));
    }
}
