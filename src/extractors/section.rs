// src/extractors/section.rs

// --- Imports ---
use std::collections::BTreeMap;

use crate::report::models::Bureau;
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

// --- Bureau splitter (Lazy Static) ---
static BUREAU_SPLITTER: Lazy<SectionSplitter> = Lazy::new(|| {
    let anchors: Vec<&str> = Bureau::ALL.iter().map(|b| b.anchor()).collect();
    SectionSplitter::new(&anchors).expect("Failed to compile BUREAU_SPLITTER")
});

// --- Data Structures ---

/// One place in the text where an anchor matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorHit {
    pub anchor: usize, // Index into the splitter's anchor list
    pub offset: usize, // Byte offset of the match
}

/// The slice of text attributed to one anchor, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'t> {
    pub anchor: usize,
    pub start: usize,
    pub end: usize,
    pub text: &'t str,
}

/// Splits flat text into named sections using case-insensitive anchors.
///
/// A section starts at the first occurrence of its anchor anywhere in the
/// text and ends at the next occurrence of any *other* anchor after that
/// point, or at the end of the text. Each anchor is searched on its own, so an
/// anchor that contains another never hides the shorter one's occurrences.
#[derive(Debug)]
pub struct SectionSplitter {
    anchors: Vec<String>,
    patterns: Vec<Regex>,
}

impl SectionSplitter {
    pub fn new<S: AsRef<str>>(anchors: &[S]) -> Result<Self, ExtractError> {
        if anchors.is_empty() {
            return Err(ExtractError::InvalidAnchor("anchor list is empty".to_string()));
        }

        let mut names: Vec<String> = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let anchor = anchor.as_ref();
            if anchor.trim().is_empty() {
                return Err(ExtractError::InvalidAnchor("anchor text is blank".to_string()));
            }
            if names.iter().any(|n| n.eq_ignore_ascii_case(anchor)) {
                return Err(ExtractError::InvalidAnchor(format!("duplicate anchor '{}'", anchor)));
            }
            names.push(anchor.to_string());
        }

        let patterns = names
            .iter()
            .map(|n| RegexBuilder::new(&regex::escape(n)).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { anchors: names, patterns })
    }

    pub fn anchor_name(&self, index: usize) -> Option<&str> {
        self.anchors.get(index).map(String::as_str)
    }

    /// Every anchor occurrence, in document order.
    ///
    /// Hits of different anchors may overlap. At equal offsets the
    /// earlier-listed anchor comes first.
    pub fn occurrences(&self, text: &str) -> Vec<AnchorHit> {
        let mut hits: Vec<AnchorHit> = self
            .patterns
            .iter()
            .enumerate()
            .flat_map(|(anchor, pattern)| {
                pattern.find_iter(text).map(move |m| AnchorHit { anchor, offset: m.start() })
            })
            .collect();
        hits.sort_by_key(|h| (h.offset, h.anchor));
        hits
    }

    /// Sections for every anchor found, ordered by start offset.
    pub fn split<'t>(&self, text: &'t str) -> Vec<Section<'t>> {
        let hits = self.occurrences(text);
        tracing::trace!("Found {} anchor occurrence(s) in {} bytes", hits.len(), text.len());

        let mut sections = Vec::new();
        for (index, name) in self.anchors.iter().enumerate() {
            let Some(first) = hits.iter().find(|h| h.anchor == index) else {
                tracing::debug!("Anchor '{}' not found, section omitted", name);
                continue;
            };

            let repeats: Vec<usize> = hits
                .iter()
                .filter(|h| h.anchor == index)
                .map(|h| h.offset)
                .collect();
            if repeats.len() > 1 {
                // Later mentions can cut another section short if they fall inside it.
                tracing::debug!("Anchor '{}' occurs {} times at offsets {:?}", name, repeats.len(), repeats);
            }

            let start = first.offset;
            // At a shared start the earlier-listed anchor keeps the text.
            let end = hits
                .iter()
                .find(|h| {
                    h.anchor != index && (h.offset > start || (h.offset == start && h.anchor < index))
                })
                .map(|h| h.offset)
                .unwrap_or(text.len());

            tracing::debug!("Section '{}' spans [{}, {})", name, start, end);
            sections.push(Section { anchor: index, start, end, text: &text[start..end] });
        }

        sections.sort_by_key(|s| (s.start, s.end));
        sections
    }
}

/// Splits a merged report into its bureau sections.
pub fn split_bureaus(text: &str) -> BTreeMap<Bureau, Section<'_>> {
    BUREAU_SPLITTER
        .split(text)
        .into_iter()
        .map(|section| (Bureau::ALL[section.anchor], section))
        .collect()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn pad(text: &mut String, offset: usize) {
        while text.len() < offset {
            text.push('.');
        }
    }

    #[test]
    fn test_section_spans_to_next_anchor() {
        let mut text = String::from("Report id ");
        assert_eq!(text.len(), 10);
        text.push_str("Transunion\nScore: 712\n");
        pad(&mut text, 500);
        text.push_str("Experian\nScore: 690\n");

        let sections = split_bureaus(&text);
        let tu = sections.get(&Bureau::TransUnion).expect("TransUnion section");
        assert_eq!((tu.start, tu.end), (10, 500));
        assert!(tu.text.starts_with("Transunion"));

        let ex = sections.get(&Bureau::Experian).expect("Experian section");
        assert_eq!((ex.start, ex.end), (500, text.len()));
        assert!(!sections.contains_key(&Bureau::Equifax));
    }

    #[test]
    fn test_anchor_match_is_case_insensitive() {
        let text = "EQUIFAX data\nexperian data\n";
        let sections = split_bureaus(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[&Bureau::Equifax].text, "EQUIFAX data\n");
        assert_eq!(sections[&Bureau::Experian].text, "experian data\n");
    }

    #[test]
    fn test_first_occurrence_anywhere_sets_start() {
        // Experian is mentioned in the header before the TransUnion block.
        let text = "Sources: Experian\nTransUnion block\nExperian block\nEquifax block\n";
        let sections = split_bureaus(text);

        let ex = sections[&Bureau::Experian];
        assert_eq!(ex.start, text.find("Experian").unwrap());
        assert_eq!(ex.end, text.find("TransUnion").unwrap());

        let tu = sections[&Bureau::TransUnion];
        assert_eq!(tu.text, "TransUnion block\n");
    }

    #[test]
    fn test_sections_never_overlap() {
        let text = "Equifax a Experian b TransUnion c Equifax d Experian e TransUnion f";
        let sections = BUREAU_SPLITTER.split(text);
        assert_eq!(sections.len(), 3);
        for pair in sections.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
        assert!(sections.iter().all(|s| s.end <= text.len()));
    }

    #[test]
    fn test_no_anchors_yields_no_sections() {
        assert!(split_bureaus("Name\nJane Doe\nScore: 700\n").is_empty());
        assert!(split_bureaus("").is_empty());
    }

    #[test]
    fn test_custom_anchor_list() {
        let splitter = SectionSplitter::new(&["Summary", "Accounts"]).unwrap();
        let sections = splitter.split("intro SUMMARY one ACCOUNTS two");
        assert_eq!(sections.len(), 2);
        assert_eq!(splitter.anchor_name(sections[0].anchor), Some("Summary"));
        assert_eq!(sections[0].text, "SUMMARY one ");
        assert_eq!(sections[1].text, "ACCOUNTS two");
    }

    #[test]
    fn test_invalid_anchor_lists_are_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(SectionSplitter::new(&empty), Err(ExtractError::InvalidAnchor(_))));
        assert!(matches!(SectionSplitter::new(&["a", " "]), Err(ExtractError::InvalidAnchor(_))));
        assert!(matches!(SectionSplitter::new(&["Equifax", "EQUIFAX"]), Err(ExtractError::InvalidAnchor(_))));
    }

    #[test]
    fn test_nested_anchor_keeps_its_first_occurrence() {
        let splitter = SectionSplitter::new(&["Credit Report", "Report"]).unwrap();
        let text = "Credit Report header. Report body";

        let hits = splitter.occurrences(text);
        assert_eq!(
            hits,
            vec![
                AnchorHit { anchor: 0, offset: 0 },
                AnchorHit { anchor: 1, offset: 7 },
                AnchorHit { anchor: 1, offset: 22 },
            ]
        );

        let sections = splitter.split(text);
        assert_eq!(sections.len(), 2);
        assert_eq!((sections[0].anchor, sections[0].start, sections[0].end), (0, 0, 7));
        assert_eq!((sections[1].anchor, sections[1].start, sections[1].end), (1, 7, text.len()));
    }

    #[test]
    fn test_shared_start_goes_to_earlier_anchor() {
        let splitter = SectionSplitter::new(&["Report Date", "Report"]).unwrap();
        let text = "Report Date: 03/01/2024\nbody";
        let sections = splitter.split(text);

        assert_eq!(sections.len(), 2);
        assert_eq!((sections[0].anchor, sections[0].start, sections[0].end), (1, 0, 0));
        assert_eq!((sections[1].anchor, sections[1].start, sections[1].end), (0, 0, text.len()));
        assert!(sections[0].text.is_empty());
    }

    #[test]
    fn test_anchor_text_is_escaped() {
        let splitter = SectionSplitter::new(&["Part (1)", "Part (2)"]).unwrap();
        let sections = splitter.split("Part (1) alpha Part (2) beta");
        assert_eq!(sections[0].text, "Part (1) alpha ");
    }
}
