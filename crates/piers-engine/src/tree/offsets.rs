//! # Offset Indexer
//!
//! Derives the single global index space of a [`Snapshot`].
//!
//! Traversal order is depth-first: top-level elements in sequence; inside a
//! table, rows in sequence, cells in sequence, then each cell's own elements
//! recursively. Text runs consume one index per character; every other leaf
//! (page break, block image, inline image) consumes exactly one. Indexing
//! starts at [`FIRST_INDEX`], and the position just past the last leaf is
//! always a valid end-of-body position.

use super::{
    Image, InlineImage, Paragraph, Run, Snapshot, StructuralElement, TableCell, TableRow, TextRun,
    text_len,
};

/// Index of the first character of every body.
pub const FIRST_INDEX: usize = 1;

/// Indices consumed by a non-text leaf.
pub const PLACEHOLDER_LEN: usize = 1;

/// A leaf of the tree: something that occupies indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf<'a> {
    Text(&'a TextRun),
    InlineImage(&'a InlineImage),
    PageBreak,
    Image(&'a Image),
}

impl Leaf<'_> {
    pub fn len(&self) -> usize {
        match self {
            Leaf::Text(run) => text_len(&run.text),
            Leaf::InlineImage(_) | Leaf::PageBreak | Leaf::Image(_) => PLACEHOLDER_LEN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lazy iterator of `(leaf, start)` pairs in document order.
///
/// Cloning restarts nothing: a clone continues from the same position. Call
/// [`offsets`] again to restart from the top.
#[derive(Debug, Clone)]
pub struct Offsets<'a> {
    stack: Vec<Frame<'a>>,
    next: usize,
}

#[derive(Debug, Clone)]
enum Frame<'a> {
    Elements(std::slice::Iter<'a, StructuralElement>),
    Runs(std::slice::Iter<'a, Run>),
    Rows(std::slice::Iter<'a, TableRow>),
    Cells(std::slice::Iter<'a, TableCell>),
}

enum Step<'a> {
    Pop,
    Push(Frame<'a>),
    Emit(Leaf<'a>),
}

/// Walks `snapshot` lazily, yielding each leaf with its absolute start index.
pub fn offsets(snapshot: &Snapshot) -> Offsets<'_> {
    Offsets {
        stack: vec![Frame::Elements(snapshot.body().iter())],
        next: FIRST_INDEX,
    }
}

impl<'a> Iterator for Offsets<'a> {
    type Item = (Leaf<'a>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let step = match self.stack.last_mut()? {
                Frame::Elements(iter) => match iter.next() {
                    None => Step::Pop,
                    Some(StructuralElement::Paragraph(p)) => Step::Push(Frame::Runs(p.runs.iter())),
                    Some(StructuralElement::Table(t)) => Step::Push(Frame::Rows(t.rows.iter())),
                    Some(StructuralElement::PageBreak) => Step::Emit(Leaf::PageBreak),
                    Some(StructuralElement::Image(image)) => Step::Emit(Leaf::Image(image)),
                },
                Frame::Runs(iter) => match iter.next() {
                    None => Step::Pop,
                    Some(Run::Text(run)) => Step::Emit(Leaf::Text(run)),
                    Some(Run::InlineImage(image)) => Step::Emit(Leaf::InlineImage(image)),
                },
                Frame::Rows(iter) => match iter.next() {
                    None => Step::Pop,
                    Some(row) => Step::Push(Frame::Cells(row.cells.iter())),
                },
                Frame::Cells(iter) => match iter.next() {
                    None => Step::Pop,
                    Some(cell) => Step::Push(Frame::Elements(cell.content.iter())),
                },
            };

            match step {
                Step::Pop => {
                    self.stack.pop();
                }
                Step::Push(frame) => self.stack.push(frame),
                Step::Emit(leaf) => {
                    let start = self.next;
                    self.next += leaf.len();
                    return Some((leaf, start));
                }
            }
        }
    }
}

/// Summary of a snapshot's index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetMap {
    text_length: usize,
    placeholders: usize,
}

impl OffsetMap {
    pub fn of(snapshot: &Snapshot) -> Self {
        let mut map = Self {
            text_length: 0,
            placeholders: 0,
        };
        for (leaf, _) in offsets(snapshot) {
            match leaf {
                Leaf::Text(run) => map.text_length += text_len(&run.text),
                _ => map.placeholders += 1,
            }
        }
        map
    }

    /// Characters contributed by text runs.
    pub fn text_length(&self) -> usize {
        self.text_length
    }

    /// Every index consumed by a leaf, text or placeholder.
    pub fn total_length(&self) -> usize {
        self.text_length + self.placeholders * PLACEHOLDER_LEN
    }

    /// The implicit end-of-body position: one past the last consumed index.
    pub fn end_index(&self) -> usize {
        self.total_length() + FIRST_INDEX
    }

    /// Whether `at` is a position an insertion may target.
    pub fn accepts_insertion_at(&self, at: usize) -> bool {
        (FIRST_INDEX..=self.end_index()).contains(&at)
    }
}

/// What kind of block a [`BlockSpan`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    PageBreak,
    Image,
}

/// A leaf-bearing block with its own `[start, end)` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub kind: BlockKind,
    pub start: usize,
    pub end: usize,
    /// Number of tables enclosing this block.
    pub table_depth: usize,
}

impl BlockSpan {
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// Every paragraph, page break and block image in document order.
///
/// Tables themselves consume no indices, so block spans never overlap.
pub fn block_spans(snapshot: &Snapshot) -> Vec<BlockSpan> {
    let mut out = Vec::new();
    let mut cursor = FIRST_INDEX;
    collect_blocks(snapshot.body(), 0, &mut cursor, &mut out);
    out
}

fn collect_blocks(
    elements: &[StructuralElement],
    table_depth: usize,
    cursor: &mut usize,
    out: &mut Vec<BlockSpan>,
) {
    for element in elements {
        let start = *cursor;
        let kind = match element {
            StructuralElement::Paragraph(p) => {
                *cursor += paragraph_len(p);
                BlockKind::Paragraph
            }
            StructuralElement::PageBreak => {
                *cursor += PLACEHOLDER_LEN;
                BlockKind::PageBreak
            }
            StructuralElement::Image(_) => {
                *cursor += PLACEHOLDER_LEN;
                BlockKind::Image
            }
            StructuralElement::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    collect_blocks(&cell.content, table_depth + 1, cursor, out);
                }
                continue;
            }
        };
        out.push(BlockSpan {
            kind,
            start,
            end: *cursor,
            table_depth,
        });
    }
}

fn paragraph_len(paragraph: &Paragraph) -> usize {
    paragraph
        .runs
        .iter()
        .map(|run| match run {
            Run::Text(text) => text_len(&text.text),
            Run::InlineImage(_) => PLACEHOLDER_LEN,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{nested_table_snapshot, snapshot_of, table};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_body_has_only_the_end_position() {
        let snapshot = snapshot_of(vec![]);
        assert_eq!(offsets(&snapshot).count(), 0);
        let map = OffsetMap::of(&snapshot);
        assert_eq!(map.total_length(), 0);
        assert_eq!(map.end_index(), 1);
        assert!(map.accepts_insertion_at(1));
        assert!(!map.accepts_insertion_at(0));
        assert!(!map.accepts_insertion_at(2));
    }

    #[test]
    fn runs_are_numbered_from_one() {
        let snapshot = snapshot_of(vec![
            StructuralElement::paragraph("Hello\n"),
            StructuralElement::paragraph("World\n"),
        ]);
        let starts: Vec<usize> = offsets(&snapshot).map(|(_, start)| start).collect();
        assert_eq!(starts, vec![1, 7]);
        assert_eq!(OffsetMap::of(&snapshot).end_index(), 13);
    }

    #[test]
    fn placeholders_consume_one_index() {
        let snapshot = snapshot_of(vec![
            StructuralElement::Paragraph(Paragraph::new(vec![
                Run::Text(TextRun::plain("ab")),
                Run::InlineImage(InlineImage::default()),
                Run::Text(TextRun::plain("c\n")),
            ])),
            StructuralElement::PageBreak,
            StructuralElement::paragraph("d\n"),
        ]);
        let starts: Vec<usize> = offsets(&snapshot).map(|(_, start)| start).collect();
        assert_eq!(starts, vec![1, 3, 4, 6, 7]);

        let map = OffsetMap::of(&snapshot);
        assert_eq!(map.text_length(), 6);
        assert_eq!(map.total_length(), 8);
        assert_eq!(map.end_index(), 9);
    }

    #[test]
    fn tables_are_walked_row_by_row_cell_by_cell() {
        let snapshot = snapshot_of(vec![
            StructuralElement::paragraph("x\n"),
            table(&[&["a1\n", "b1\n"], &["a2\n", "b2\n"]]),
            StructuralElement::paragraph("y\n"),
        ]);
        let texts: Vec<(String, usize)> = offsets(&snapshot)
            .map(|(leaf, start)| match leaf {
                Leaf::Text(run) => (run.text.clone(), start),
                other => panic!("unexpected leaf {other:?}"),
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                ("x\n".to_string(), 1),
                ("a1\n".to_string(), 3),
                ("b1\n".to_string(), 6),
                ("a2\n".to_string(), 9),
                ("b2\n".to_string(), 12),
                ("y\n".to_string(), 15),
            ]
        );
    }

    #[test]
    fn table_without_rows_contributes_nothing() {
        let snapshot = snapshot_of(vec![
            StructuralElement::Table(crate::tree::Table::default()),
            StructuralElement::paragraph("z\n"),
        ]);
        assert_eq!(offsets(&snapshot).next().map(|(_, s)| s), Some(1));
        assert_eq!(block_spans(&snapshot).len(), 1);
    }

    #[test]
    fn iteration_is_restartable() {
        let snapshot = nested_table_snapshot();
        let first: Vec<usize> = offsets(&snapshot).map(|(_, s)| s).collect();
        let second: Vec<usize> = offsets(&snapshot).map(|(_, s)| s).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn block_spans_cover_nested_cells() {
        let snapshot = nested_table_snapshot();
        let spans = block_spans(&snapshot);
        let depths: Vec<usize> = spans.iter().map(|s| s.table_depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1, 0]);

        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(
            spans.last().map(|s| s.end),
            Some(OffsetMap::of(&snapshot).end_index())
        );
    }
}
