//! # Range Resolver
//!
//! Turns a human-friendly [`Target`] into a validated [`Range`] bound to the
//! snapshot it was resolved against.

use serde::Serialize;

use crate::error::{EngineError, RangeFault};
use crate::tree::extract::Projection;
use crate::tree::offsets::{BlockSpan, FIRST_INDEX, OffsetMap, block_spans};
use crate::tree::{Snapshot, SnapshotId, text_len};

/// A half-open `[start, end)` interval of document indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    #[serde(rename = "startIndex")]
    start: usize,
    #[serde(rename = "endIndex")]
    end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<SnapshotId>,
}

impl Range {
    /// A range not tied to any snapshot.
    ///
    /// Only meaningful inside translator output and body replacements, where
    /// coordinates are relative to content that does not exist yet.
    pub fn unbound(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            snapshot: None,
        }
    }

    pub(crate) fn bound(start: usize, end: usize, snapshot: SnapshotId) -> Self {
        Self {
            start,
            end,
            snapshot: Some(snapshot),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn snapshot(&self) -> Option<SnapshotId> {
        self.snapshot
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// What the caller wants to address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Explicit { start: usize, end: usize },
    /// The `occurrence`-th (1-based) non-overlapping match of `needle`.
    Search { needle: String, occurrence: usize },
    /// The paragraph, page break or block image containing `index`.
    ParagraphAt { index: usize },
    /// The paragraph containing the start of a search match.
    ParagraphContaining { needle: String, occurrence: usize },
}

impl Target {
    pub fn search(needle: impl Into<String>) -> Self {
        Self::Search {
            needle: needle.into(),
            occurrence: 1,
        }
    }
}

pub fn resolve(snapshot: &Snapshot, target: &Target) -> Result<Range, EngineError> {
    match target {
        Target::Explicit { start, end } => {
            validate(&OffsetMap::of(snapshot), *start, *end)?;
            Ok(Range::bound(*start, *end, snapshot.id()))
        }
        Target::Search { needle, occurrence } => {
            let (start, end) = search(snapshot, needle, *occurrence)?;
            Ok(Range::bound(start, end, snapshot.id()))
        }
        Target::ParagraphAt { index } => paragraph_at(snapshot, *index),
        Target::ParagraphContaining { needle, occurrence } => {
            let (start, _) = search(snapshot, needle, *occurrence)?;
            paragraph_at(snapshot, start)
        }
    }
}

/// Checks `[start, end)` against the bounds of a body.
pub fn validate(map: &OffsetMap, start: usize, end: usize) -> Result<(), EngineError> {
    let fault = if start < FIRST_INDEX {
        RangeFault::StartBeforeBody
    } else if end <= start {
        RangeFault::NotIncreasing
    } else if end > map.end_index() {
        RangeFault::PastEndOfBody {
            end_of_body: map.end_index(),
        }
    } else {
        return Ok(());
    };
    Err(EngineError::InvalidRange { start, end, fault })
}

/// Widens `range` to the union of the blocks holding its first and last index.
pub fn expand_to_paragraphs(snapshot: &Snapshot, range: Range) -> Result<Range, EngineError> {
    let blocks = block_spans(snapshot);
    let first = containing(&blocks, range.start)
        .ok_or_else(|| no_paragraph(range.start, range.end))?;
    let last = containing(&blocks, range.end.saturating_sub(1).max(range.start))
        .ok_or_else(|| no_paragraph(range.start, range.end))?;
    Ok(Range::bound(first.start, last.end, snapshot.id()))
}

fn paragraph_at(snapshot: &Snapshot, index: usize) -> Result<Range, EngineError> {
    let blocks = block_spans(snapshot);
    let block = containing(&blocks, index).ok_or_else(|| no_paragraph(index, index + 1))?;
    Ok(Range::bound(block.start, block.end, snapshot.id()))
}

fn containing(blocks: &[BlockSpan], index: usize) -> Option<&BlockSpan> {
    let at = blocks.partition_point(|b| b.end <= index);
    blocks.get(at).filter(|b| b.contains(index))
}

fn no_paragraph(start: usize, end: usize) -> EngineError {
    EngineError::InvalidRange {
        start,
        end,
        fault: RangeFault::NoParagraph,
    }
}

/// Document span of the `occurrence`-th match of `needle`.
fn search(snapshot: &Snapshot, needle: &str, occurrence: usize) -> Result<(usize, usize), EngineError> {
    let projection = Projection::of(snapshot);
    let (start, end) = find_occurrence(projection.text(), needle, occurrence)?;
    projection
        .doc_span(start, end)
        .ok_or_else(|| EngineError::TextNotFound {
            needle: needle.to_string(),
            occurrence,
            found: 0,
        })
}

/// Character span of the `occurrence`-th non-overlapping match in `text`.
pub fn find_occurrence(
    text: &str,
    needle: &str,
    occurrence: usize,
) -> Result<(usize, usize), EngineError> {
    let mut found = 0;
    if !needle.is_empty() && occurrence > 0 {
        let needle_len = text_len(needle);
        let mut chars = 0;
        let mut last_byte = 0;
        for (byte, _) in text.match_indices(needle) {
            chars += text_len(&text[last_byte..byte]);
            last_byte = byte;
            found += 1;
            if found == occurrence {
                return Ok((chars, chars + needle_len));
            }
        }
    }
    Err(EngineError::TextNotFound {
        needle: needle.to_string(),
        occurrence,
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{nested_table_snapshot, snapshot_of, snapshot_of_lines};
    use crate::tree::{InlineImage, Paragraph, Run, StructuralElement, TextRun};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn span(range: Range) -> (usize, usize) {
        (range.start(), range.end())
    }

    #[rstest]
    #[case(1, 13)]
    #[case(1, 2)]
    #[case(12, 13)]
    fn explicit_ranges_inside_the_body_resolve(#[case] start: usize, #[case] end: usize) {
        let snapshot = snapshot_of_lines("Hello\nWorld\n");
        let range = resolve(&snapshot, &Target::Explicit { start, end }).unwrap();
        assert_eq!(span(range), (start, end));
        assert_eq!(range.snapshot(), Some(snapshot.id()));
    }

    #[rstest]
    #[case(0, 3, RangeFault::StartBeforeBody)]
    #[case(4, 4, RangeFault::NotIncreasing)]
    #[case(5, 2, RangeFault::NotIncreasing)]
    #[case(1, 14, RangeFault::PastEndOfBody { end_of_body: 13 })]
    fn explicit_ranges_name_the_failed_bound(
        #[case] start: usize,
        #[case] end: usize,
        #[case] fault: RangeFault,
    ) {
        let snapshot = snapshot_of_lines("Hello\nWorld\n");
        assert_eq!(
            resolve(&snapshot, &Target::Explicit { start, end }),
            Err(EngineError::InvalidRange { start, end, fault })
        );
    }

    #[test]
    fn search_finds_nth_non_overlapping_match() {
        let snapshot = snapshot_of_lines("ababab");
        let target = Target::Search {
            needle: "ab".into(),
            occurrence: 2,
        };
        assert_eq!(span(resolve(&snapshot, &target).unwrap()), (3, 5));

        let overlapping = snapshot_of_lines("aaaa");
        let target = Target::Search {
            needle: "aa".into(),
            occurrence: 3,
        };
        assert_eq!(
            resolve(&overlapping, &target),
            Err(EngineError::TextNotFound {
                needle: "aa".into(),
                occurrence: 3,
                found: 2,
            })
        );
    }

    #[rstest]
    #[case("", 1)]
    #[case("ab", 0)]
    fn degenerate_searches_find_nothing(#[case] needle: &str, #[case] occurrence: usize) {
        let snapshot = snapshot_of_lines("ababab");
        let target = Target::Search {
            needle: needle.into(),
            occurrence,
        };
        assert!(matches!(
            resolve(&snapshot, &target),
            Err(EngineError::TextNotFound { found: 0, .. })
        ));
    }

    #[test]
    fn search_counts_characters_not_bytes() {
        let snapshot = snapshot_of_lines("héllo wörld\n");
        let range = resolve(&snapshot, &Target::search("wörld")).unwrap();
        assert_eq!(span(range), (7, 12));
    }

    #[test]
    fn search_skips_over_placeholders() {
        let snapshot = snapshot_of(vec![
            StructuralElement::paragraph("intro\n"),
            StructuralElement::PageBreak,
            StructuralElement::Paragraph(Paragraph::new(vec![
                Run::Text(TextRun::plain("see ")),
                Run::InlineImage(InlineImage::default()),
                Run::Text(TextRun::plain("figure\n")),
            ])),
        ]);
        // intro\n = 1..7, break = 7, "see " = 8..12, image = 12, figure = 13..19
        assert_eq!(span(resolve(&snapshot, &Target::search("figure")).unwrap()), (13, 19));
        assert_eq!(span(resolve(&snapshot, &Target::search("\nsee")).unwrap()), (6, 11));
        assert_eq!(span(resolve(&snapshot, &Target::search("see f")).unwrap()), (8, 14));
    }

    #[test]
    fn search_reaches_into_table_cells() {
        let snapshot = nested_table_snapshot();
        // top\n=1..5 left\n=5..10 deep\n=10..15
        assert_eq!(span(resolve(&snapshot, &Target::search("deep")).unwrap()), (10, 14));
    }

    #[rstest]
    #[case(1, (1, 5))]
    #[case(4, (1, 5))]
    #[case(12, (10, 15))]
    #[case(21, (21, 25))]
    fn paragraph_at_returns_the_innermost_block(
        #[case] index: usize,
        #[case] expected: (usize, usize),
    ) {
        let snapshot = nested_table_snapshot();
        let range = resolve(&snapshot, &Target::ParagraphAt { index }).unwrap();
        assert_eq!(span(range), expected);
    }

    #[test]
    fn paragraph_at_end_of_body_is_an_error() {
        let snapshot = snapshot_of_lines("one\n");
        assert_eq!(
            resolve(&snapshot, &Target::ParagraphAt { index: 5 }),
            Err(EngineError::InvalidRange {
                start: 5,
                end: 6,
                fault: RangeFault::NoParagraph,
            })
        );
    }

    #[test]
    fn paragraph_containing_expands_a_match() {
        let snapshot = snapshot_of_lines("first line\nsecond line\n");
        let target = Target::ParagraphContaining {
            needle: "line".into(),
            occurrence: 2,
        };
        assert_eq!(span(resolve(&snapshot, &target).unwrap()), (12, 24));
    }

    #[test]
    fn expansion_covers_every_touched_paragraph() {
        let snapshot = snapshot_of_lines("aa\nbb\ncc\n");
        let range = resolve(&snapshot, &Target::Explicit { start: 2, end: 5 }).unwrap();
        assert_eq!(span(expand_to_paragraphs(&snapshot, range).unwrap()), (1, 7));
    }
}
