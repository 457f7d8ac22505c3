//! Notation types and their fence-language spellings.

use std::fmt;

/// A category of deferred content with its own renderer adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotationType {
    Math,
    Flowchart,
    Sequence,
    ClassDiagram,
    Circuit,
    Mindmap,
    Uml,
    Chart,
    Tablature,
    Timing,
}

impl NotationType {
    pub const ALL: [Self; 10] = [
        Self::Math,
        Self::Flowchart,
        Self::Sequence,
        Self::ClassDiagram,
        Self::Circuit,
        Self::Mindmap,
        Self::Uml,
        Self::Chart,
        Self::Tablature,
        Self::Timing,
    ];

    /// Map a fence language tag to a notation, if it names one.
    ///
    /// Anything unrecognized falls through to plain highlighted code.
    pub fn from_fence(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "math" => Some(Self::Math),
            "flow" | "flowchart" => Some(Self::Flowchart),
            "sequence" | "seq" => Some(Self::Sequence),
            "class" | "class-diagram" => Some(Self::ClassDiagram),
            "circuit" => Some(Self::Circuit),
            "mindmap" => Some(Self::Mindmap),
            "uml" => Some(Self::Uml),
            "chart" => Some(Self::Chart),
            "tab" | "tablature" | "abc" => Some(Self::Tablature),
            "timing" | "wave" => Some(Self::Timing),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequence",
            Self::ClassDiagram => "class",
            Self::Circuit => "circuit",
            Self::Mindmap => "mindmap",
            Self::Uml => "uml",
            Self::Chart => "chart",
            Self::Tablature => "tablature",
            Self::Timing => "timing",
        }
    }
}

impl fmt::Display for NotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_tags_resolve_case_insensitively() {
        assert_eq!(NotationType::from_fence("FlowChart"), Some(NotationType::Flowchart));
        assert_eq!(NotationType::from_fence("SEQ"), Some(NotationType::Sequence));
    }

    #[test]
    fn test_unknown_fence_tags_fall_through() {
        assert_eq!(NotationType::from_fence("rust"), None);
        assert_eq!(NotationType::from_fence(""), None);
    }

    #[test]
    fn test_every_notation_has_a_distinct_label() {
        let mut labels: Vec<_> = NotationType::ALL.iter().map(|n| n.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), NotationType::ALL.len());
    }

    #[test]
    fn test_labels_round_trip_through_from_fence() {
        for notation in NotationType::ALL {
            assert_eq!(NotationType::from_fence(notation.as_str()), Some(notation));
        }
    }
}
