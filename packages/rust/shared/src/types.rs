//! Core domain types for detected book structures.

use serde::{Deserialize, Serialize};

/// A single detected chapter: a title plus the ordered text fragments that
/// were accumulated for it, one per annotated chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter title as extracted from the annotation response. Empty when
    /// the chapter was opened without a detected boundary.
    pub title: String,
    /// Ordered content fragments, in chunk order.
    pub content: Vec<String>,
}

impl Chapter {
    /// A chapter with no title and no content is never persisted into the
    /// final structure.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.content.is_empty()
    }
}

/// The aggregated result of structure extraction over a whole text.
///
/// Chapters preserve detection order. Downstream consumers may assume the
/// chapter list is non-empty: the extractor applies a catch-all fallback
/// before handing the structure over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookStructure {
    /// Book title from the initial analysis pass; empty if not detected.
    pub title: String,
    /// Author from the initial analysis pass; empty if not detected.
    pub author: String,
    /// Detected chapters, in detection order.
    pub chapters: Vec<Chapter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_emptiness() {
        assert!(Chapter::default().is_empty());

        let titled = Chapter {
            title: "Prologue".into(),
            content: vec![],
        };
        assert!(!titled.is_empty());

        let untitled = Chapter {
            title: String::new(),
            content: vec!["some prose".into()],
        };
        assert!(!untitled.is_empty());
    }

    #[test]
    fn structure_serde_roundtrip() {
        let structure = BookStructure {
            title: "La Obra".into(),
            author: "Fulano de Tal".into(),
            chapters: vec![Chapter {
                title: "Part One".into(),
                content: vec!["First fragment.".into(), "Second fragment.".into()],
            }],
        };

        let json = serde_json::to_string(&structure).expect("serialize");
        let parsed: BookStructure = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, structure);
    }
}
