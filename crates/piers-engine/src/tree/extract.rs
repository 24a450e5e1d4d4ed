//! Flattened plain-text view of a snapshot.
//!
//! Only text runs contribute; tables are flattened in place with no
//! separators and placeholders are skipped. [`Projection`] keeps enough of
//! the walk to map a position in the flattened text back to a document index.

use super::offsets::{Leaf, offsets};
use super::{Snapshot, text_len};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    /// Characters in the untruncated text.
    pub total_length: usize,
    pub truncated: bool,
}

impl Extracted {
    pub fn is_empty(&self) -> bool {
        self.total_length == 0
    }

    /// Characters left out by truncation.
    pub fn remaining(&self) -> usize {
        self.total_length - text_len(&self.text)
    }
}

/// Concatenates the text of every run, keeping at most `max_length` characters.
pub fn extract(snapshot: &Snapshot, max_length: Option<usize>) -> Extracted {
    let mut text = String::new();
    let mut kept = 0usize;
    let mut total_length = 0usize;

    for (leaf, _) in offsets(snapshot) {
        let Leaf::Text(run) = leaf else {
            continue;
        };
        let len = text_len(&run.text);
        total_length += len;

        let room = max_length.map_or(len, |max| max.saturating_sub(kept).min(len));
        if room == len {
            text.push_str(&run.text);
        } else if room > 0 {
            text.extend(run.text.chars().take(room));
        }
        kept += room;
    }

    Extracted {
        truncated: kept < total_length,
        text,
        total_length,
    }
}

/// One text run as seen from both coordinate systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    text_start: usize,
    doc_start: usize,
    len: usize,
}

/// Untruncated flattened text plus the map back to document indices.
#[derive(Debug, Clone)]
pub struct Projection {
    text: String,
    segments: Vec<Segment>,
}

impl Projection {
    pub fn of(snapshot: &Snapshot) -> Self {
        let mut text = String::new();
        let mut segments = Vec::new();
        let mut text_start = 0;

        for (leaf, doc_start) in offsets(snapshot) {
            let Leaf::Text(run) = leaf else {
                continue;
            };
            let len = text_len(&run.text);
            if len == 0 {
                continue;
            }
            text.push_str(&run.text);
            segments.push(Segment {
                text_start,
                doc_start,
                len,
            });
            text_start += len;
        }

        Self { text, segments }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Document index of the character at `offset` in the flattened text.
    ///
    /// Returns `None` when `offset` is past the last character.
    pub fn doc_index(&self, offset: usize) -> Option<usize> {
        let at = self
            .segments
            .partition_point(|s| s.text_start + s.len <= offset);
        let segment = self.segments.get(at)?;
        Some(segment.doc_start + (offset - segment.text_start))
    }

    /// Document range of the flattened span `[start, end)`.
    ///
    /// The end maps from the last character inside the span, so a match that
    /// ends right before a placeholder does not swallow it.
    pub fn doc_span(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if end <= start {
            return None;
        }
        Some((self.doc_index(start)?, self.doc_index(end - 1)? + 1))
    }
}
