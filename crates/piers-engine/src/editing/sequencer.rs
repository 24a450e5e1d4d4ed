//! Left-to-right delta accumulation over a batch of intents.
//!
//! Every intent is written against the original snapshot. The sequencer keeps
//! the accumulated effect of all strictly earlier intents in a [`ShiftMap`]
//! and rewrites each intent's positions so the emitted batch can be applied
//! in order without any index drifting.

use serde::Serialize;

use crate::editing::EditIntent;
use crate::error::{BatchFault, EngineError};
use crate::markup::Fragment;
use crate::resolve::{Range, validate};
use crate::tree::offsets::{FIRST_INDEX, OffsetMap};
use crate::tree::{Snapshot, SnapshotId, text_len};

/// An ordered, index-consistent group of intents for one snapshot.
///
/// Not `Clone`; providers consume it when applying.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBatch {
    document_id: String,
    snapshot: SnapshotId,
    intents: Vec<EditIntent>,
}

impl EditBatch {
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }

    pub fn intents(&self) -> &[EditIntent] {
        &self.intents
    }

    pub fn into_intents(self) -> Vec<EditIntent> {
        self.intents
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }
}

/// Accumulated effect of earlier intents, in original coordinates.
///
/// Text inserted at `p` sits before original index `p` and after anything
/// inserted there earlier. A delete of `[a, b)` removes the original indices
/// in it together with text inserted strictly inside it; text inserted at `a`
/// or `b` survives.
#[derive(Debug, Clone, Default)]
pub struct ShiftMap {
    /// Surviving inserts as `(anchor, length)`.
    inserts: Vec<(usize, usize)>,
    /// Disjoint, sorted, merged `[a, b)` intervals.
    deleted: Vec<(usize, usize)>,
}

impl ShiftMap {
    /// Where original index `x` sits once every recorded edit is applied.
    ///
    /// Text inserted at `x` lands before it. Use this for insertion points and
    /// range starts.
    pub fn map(&self, x: usize) -> usize {
        self.locate(x, |p| p <= x)
    }

    /// Where the boundary just before original index `x` sits, ahead of any
    /// text inserted at `x`. Use this for range ends.
    pub fn map_end(&self, x: usize) -> usize {
        self.locate(x, |p| p < x)
    }

    fn locate(&self, x: usize, before: impl Fn(usize) -> bool) -> usize {
        let grown: usize = self
            .inserts
            .iter()
            .filter(|(p, _)| before(*p))
            .map(|(_, len)| len)
            .sum();
        let shrunk: usize = self
            .deleted
            .iter()
            .take_while(|(a, _)| *a < x)
            .map(|(a, b)| x.min(*b) - a)
            .sum();
        x + grown - shrunk
    }

    pub fn record_insert(&mut self, at: usize, len: usize) {
        if len > 0 {
            self.inserts.push((at, len));
        }
    }

    /// Records `[a, b)` as deleted, counting characters already deleted once.
    pub fn record_delete(&mut self, a: usize, b: usize) {
        if b <= a {
            return;
        }
        self.inserts.retain(|(p, _)| *p <= a || *p >= b);
        let (mut start, mut end) = (a, b);
        let mut merged = Vec::with_capacity(self.deleted.len() + 1);
        let mut placed = false;
        for &(da, db) in &self.deleted {
            if db < start {
                merged.push((da, db));
            } else if end < da {
                if !placed {
                    merged.push((start, end));
                    placed = true;
                }
                merged.push((da, db));
            } else {
                start = start.min(da);
                end = end.max(db);
            }
        }
        if !placed {
            merged.push((start, end));
        }
        self.deleted = merged;
    }
}

/// Builds one [`EditBatch`] from intents and translator fragments.
#[derive(Debug)]
pub struct Sequencer<'a> {
    snapshot: &'a Snapshot,
    offsets: OffsetMap,
    shifts: ShiftMap,
    intents: Vec<EditIntent>,
    position: usize,
    replaced: bool,
}

impl<'a> Sequencer<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            offsets: OffsetMap::of(snapshot),
            shifts: ShiftMap::default(),
            intents: Vec::new(),
            position: 0,
            replaced: false,
        }
    }

    /// Adds an intent resolved against the original snapshot.
    pub fn push(&mut self, intent: EditIntent) -> Result<(), EngineError> {
        let position = self.next_position(&intent)?;

        if let EditIntent::ReplaceBody { content } = &intent {
            check_replacement(position, content)?;
            self.replaced = true;
            self.intents.push(intent);
            return Ok(());
        }

        self.check_top_level(position, &intent)?;
        let shifted = match intent {
            EditIntent::InsertText { at, text } => {
                let len = text_len(&text);
                let intent = EditIntent::InsertText {
                    at: self.shifts.map(at),
                    text,
                };
                self.shifts.record_insert(at, len);
                Some(intent)
            }
            EditIntent::InsertTable { at, rows, cols } => {
                let intent = EditIntent::InsertTable {
                    at: self.shifts.map(at),
                    rows,
                    cols,
                };
                self.shifts.record_insert(at, rows * cols);
                Some(intent)
            }
            EditIntent::InsertPageBreak { at } => {
                let intent = EditIntent::InsertPageBreak {
                    at: self.shifts.map(at),
                };
                self.shifts.record_insert(at, 1);
                Some(intent)
            }
            EditIntent::InsertImage {
                at,
                url,
                width,
                height,
            } => {
                let intent = EditIntent::InsertImage {
                    at: self.shifts.map(at),
                    url,
                    width,
                    height,
                };
                self.shifts.record_insert(at, 1);
                Some(intent)
            }
            EditIntent::DeleteRange { range } => {
                let shifted = self.shift_range(position, "deleteRange", range);
                self.shifts.record_delete(range.start(), range.end());
                shifted.map(|range| EditIntent::DeleteRange { range })
            }
            EditIntent::ApplyTextStyle { range, patch } => self
                .shift_range(position, "applyTextStyle", range)
                .map(|range| EditIntent::ApplyTextStyle { range, patch }),
            EditIntent::ApplyParagraphStyle { range, patch } => self
                .shift_range(position, "applyParagraphStyle", range)
                .map(|range| EditIntent::ApplyParagraphStyle { range, patch }),
            EditIntent::ReplaceBody { .. } => None,
        };

        self.intents.extend(shifted);
        Ok(())
    }

    /// Adds translator output anchored at an original index.
    ///
    /// The fragment's intents are already consistent among themselves, so the
    /// whole fragment moves by the delta at its anchor and then counts as one
    /// insert of its net length.
    pub fn push_fragment(&mut self, fragment: Fragment) -> Result<(), EngineError> {
        let anchor = fragment.anchor();
        let length = fragment.length();
        let intents = fragment.into_intents();
        if intents.is_empty() {
            return Ok(());
        }

        let first = self.position;
        for intent in &intents {
            self.next_position(intent)?;
        }
        if !self.offsets.accepts_insertion_at(anchor) {
            return Err(EngineError::IncompatibleBatch {
                position: first,
                operation: intents[0].name(),
                fault: BatchFault::OutOfBounds {
                    at: anchor,
                    end_of_body: self.offsets.end_index(),
                },
            });
        }
        check_laid_out(first, &intents, anchor)?;

        let shift = self.shifts.map(anchor) as isize - anchor as isize;
        let snapshot = self.snapshot.id();
        self.intents.extend(
            intents
                .into_iter()
                .map(|intent| offset_intent(intent, shift, snapshot)),
        );
        self.shifts.record_insert(anchor, length);
        Ok(())
    }

    pub fn finish(self) -> EditBatch {
        log::debug!(
            "sequenced {} intents for document {}",
            self.intents.len(),
            self.snapshot.document_id()
        );
        EditBatch {
            document_id: self.snapshot.document_id().to_string(),
            snapshot: self.snapshot.id(),
            intents: self.intents,
        }
    }

    /// Claims the next submission position, enforcing that a body
    /// replacement stands alone.
    fn next_position(&mut self, intent: &EditIntent) -> Result<usize, EngineError> {
        let position = self.position;
        self.position += 1;
        let replacing = matches!(intent, EditIntent::ReplaceBody { .. });
        if self.replaced || (replacing && position > 0) {
            return Err(EngineError::IncompatibleBatch {
                position,
                operation: intent.name(),
                fault: BatchFault::ReplaceBodyNotAlone,
            });
        }
        Ok(position)
    }

    fn check_top_level(&self, position: usize, intent: &EditIntent) -> Result<(), EngineError> {
        check_payload(position, intent)?;

        if let Some(at) = intent.insertion_point()
            && !self.offsets.accepts_insertion_at(at)
        {
            return Err(EngineError::IncompatibleBatch {
                position,
                operation: intent.name(),
                fault: BatchFault::OutOfBounds {
                    at,
                    end_of_body: self.offsets.end_index(),
                },
            });
        }

        if let Some(range) = intent.range() {
            let fault = match range.snapshot() {
                None => Some(BatchFault::UnboundRange),
                Some(id) if id != self.snapshot.id() => Some(BatchFault::ForeignSnapshot),
                Some(_) => None,
            };
            if let Some(fault) = fault {
                return Err(EngineError::IncompatibleBatch {
                    position,
                    operation: intent.name(),
                    fault,
                });
            }
            validate(&self.offsets, range.start(), range.end())?;
        }
        Ok(())
    }

    fn shift_range(&self, position: usize, operation: &str, range: Range) -> Option<Range> {
        let start = self.shifts.map(range.start());
        let end = self.shifts.map_end(range.end());
        if end <= start {
            log::debug!(
                "dropping {operation} at position {position}: [{}, {}) was already deleted",
                range.start(),
                range.end()
            );
            return None;
        }
        Some(Range::bound(start, end, self.snapshot.id()))
    }
}

/// Sequences `intents` against `snapshot` in one call.
pub fn sequence(
    snapshot: &Snapshot,
    intents: impl IntoIterator<Item = EditIntent>,
) -> Result<EditBatch, EngineError> {
    let mut sequencer = Sequencer::new(snapshot);
    for intent in intents {
        sequencer.push(intent)?;
    }
    Ok(sequencer.finish())
}

fn check_payload(position: usize, intent: &EditIntent) -> Result<(), EngineError> {
    let fault = match intent {
        EditIntent::InsertText { text, .. } if text.is_empty() => BatchFault::EmptyInsert,
        EditIntent::InsertTable { rows, cols, .. } if *rows == 0 || *cols == 0 => {
            BatchFault::EmptyTable
        }
        EditIntent::ApplyTextStyle { patch, .. } if patch.is_empty() => BatchFault::EmptyStyle,
        EditIntent::ApplyParagraphStyle { patch, .. } if patch.is_empty() => {
            BatchFault::EmptyStyle
        }
        _ => return Ok(()),
    };
    Err(EngineError::IncompatibleBatch {
        position,
        operation: intent.name(),
        fault,
    })
}

fn check_replacement(position: usize, content: &[EditIntent]) -> Result<(), EngineError> {
    check_laid_out(position, content, FIRST_INDEX)
}

/// Checks content laid out in application order from `start`.
///
/// Each intent may only address the content produced by the intents before
/// it. Errors report `position` plus the offset of the offending intent.
fn check_laid_out(position: usize, content: &[EditIntent], start: usize) -> Result<(), EngineError> {
    let mut end_of_body = start;
    for (i, intent) in content.iter().enumerate() {
        let fail = |fault| EngineError::IncompatibleBatch {
            position: position + i,
            operation: intent.name(),
            fault,
        };
        if matches!(intent, EditIntent::ReplaceBody { .. }) {
            return Err(fail(BatchFault::NestedReplaceBody));
        }
        check_payload(position + i, intent)?;

        if let Some(at) = intent.insertion_point()
            && !(start..=end_of_body).contains(&at)
        {
            return Err(fail(BatchFault::OutOfBounds { at, end_of_body }));
        }
        if let Some(range) = intent.range()
            && (range.start() < start || range.is_empty() || range.end() > end_of_body)
        {
            return Err(fail(BatchFault::OutOfBounds {
                at: range.start(),
                end_of_body,
            }));
        }
        end_of_body = end_of_body.saturating_add_signed(intent.length_delta());
    }
    Ok(())
}

fn offset_intent(intent: EditIntent, shift: isize, snapshot: SnapshotId) -> EditIntent {
    let at = |at: usize| at.saturating_add_signed(shift);
    let range = |range: Range| Range::bound(at(range.start()), at(range.end()), snapshot);
    match intent {
        EditIntent::InsertText { at: p, text } => EditIntent::InsertText { at: at(p), text },
        EditIntent::DeleteRange { range: r } => EditIntent::DeleteRange { range: range(r) },
        EditIntent::ApplyTextStyle { range: r, patch } => EditIntent::ApplyTextStyle {
            range: range(r),
            patch,
        },
        EditIntent::ApplyParagraphStyle { range: r, patch } => EditIntent::ApplyParagraphStyle {
            range: range(r),
            patch,
        },
        EditIntent::InsertTable { at: p, rows, cols } => EditIntent::InsertTable {
            at: at(p),
            rows,
            cols,
        },
        EditIntent::InsertPageBreak { at: p } => EditIntent::InsertPageBreak { at: at(p) },
        EditIntent::InsertImage {
            at: p,
            url,
            width,
            height,
        } => EditIntent::InsertImage {
            at: at(p),
            url,
            width,
            height,
        },
        EditIntent::ReplaceBody { content } => EditIntent::ReplaceBody { content },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::TextStylePatch;
    use crate::resolve::{Target, resolve};
    use crate::tests::snapshot_of_lines;
    use pretty_assertions::assert_eq;

    fn range(snapshot: &Snapshot, start: usize, end: usize) -> Range {
        resolve(snapshot, &Target::Explicit { start, end }).unwrap()
    }

    fn spans(batch: &EditBatch) -> Vec<(&'static str, usize, usize)> {
        batch
            .intents()
            .iter()
            .map(|intent| match intent {
                EditIntent::InsertText { at, text } => (intent.name(), *at, *at + text_len(text)),
                other => match (other.insertion_point(), other.range()) {
                    (Some(at), _) => (other.name(), at, at),
                    (_, Some(r)) => (other.name(), r.start(), r.end()),
                    _ => (other.name(), 0, 0),
                },
            })
            .collect()
    }

    #[test]
    fn shift_map_merges_overlapping_deletes() {
        let mut shifts = ShiftMap::default();
        shifts.record_delete(10, 20);
        shifts.record_delete(15, 25);
        shifts.record_delete(30, 32);
        assert_eq!(shifts.deleted, vec![(10, 25), (30, 32)]);
        assert_eq!(shifts.map(5), 5);
        assert_eq!(shifts.map(12), 10);
        assert_eq!(shifts.map(26), 11);
        assert_eq!(shifts.map(40), 23);

        shifts.record_delete(24, 31);
        assert_eq!(shifts.deleted, vec![(10, 32)]);
    }

    #[test]
    fn insert_then_delete_shifts_the_delete() {
        let snapshot = snapshot_of_lines("0123456789abcdefghij\n");
        let batch = sequence(
            &snapshot,
            [
                EditIntent::InsertText {
                    at: 5,
                    text: "XY".into(),
                },
                EditIntent::DeleteRange {
                    range: range(&snapshot, 10, 12),
                },
            ],
        )
        .unwrap();
        assert_eq!(
            spans(&batch),
            vec![("insertText", 5, 7), ("deleteRange", 12, 14)]
        );
    }

    #[test]
    fn inserts_at_the_same_point_keep_submission_order() {
        let snapshot = snapshot_of_lines("abc\n");
        let batch = sequence(
            &snapshot,
            [
                EditIntent::InsertText {
                    at: 2,
                    text: "1".into(),
                },
                EditIntent::InsertText {
                    at: 2,
                    text: "22".into(),
                },
            ],
        )
        .unwrap();
        assert_eq!(
            spans(&batch),
            vec![("insertText", 2, 3), ("insertText", 3, 5)]
        );
    }

    #[test]
    fn style_inside_an_earlier_delete_is_dropped() {
        let snapshot = snapshot_of_lines("0123456789\n");
        let batch = sequence(
            &snapshot,
            [
                EditIntent::DeleteRange {
                    range: range(&snapshot, 2, 8),
                },
                EditIntent::ApplyTextStyle {
                    range: range(&snapshot, 3, 5),
                    patch: TextStylePatch::bold(),
                },
                EditIntent::ApplyTextStyle {
                    range: range(&snapshot, 6, 10),
                    patch: TextStylePatch::italic(),
                },
            ],
        )
        .unwrap();
        assert_eq!(
            spans(&batch),
            vec![("deleteRange", 2, 8), ("applyTextStyle", 2, 4)]
        );
    }

    #[test]
    fn emitted_ranges_are_bound_to_the_batch_snapshot() {
        let snapshot = snapshot_of_lines("hello\n");
        let batch = sequence(
            &snapshot,
            [EditIntent::DeleteRange {
                range: range(&snapshot, 1, 3),
            }],
        )
        .unwrap();
        assert_eq!(batch.snapshot(), snapshot.id());
        assert_eq!(
            batch.intents()[0].range().and_then(|r| r.snapshot()),
            Some(snapshot.id())
        );
    }

    #[test]
    fn foreign_and_unbound_ranges_are_rejected() {
        let snapshot = snapshot_of_lines("hello\n");
        let other = snapshot_of_lines("hello\n");

        let foreign = sequence(
            &snapshot,
            [EditIntent::DeleteRange {
                range: range(&other, 1, 3),
            }],
        );
        assert_eq!(
            foreign.unwrap_err(),
            EngineError::IncompatibleBatch {
                position: 0,
                operation: "deleteRange",
                fault: BatchFault::ForeignSnapshot,
            }
        );

        let unbound = sequence(
            &snapshot,
            [EditIntent::DeleteRange {
                range: Range::unbound(1, 3),
            }],
        );
        assert!(matches!(
            unbound,
            Err(EngineError::IncompatibleBatch {
                fault: BatchFault::UnboundRange,
                ..
            })
        ));
    }

    #[test]
    fn insertion_points_are_checked_against_the_body() {
        let snapshot = snapshot_of_lines("abc\n");
        assert!(sequence(&snapshot, [EditIntent::InsertPageBreak { at: 5 }]).is_ok());
        assert_eq!(
            sequence(&snapshot, [EditIntent::InsertPageBreak { at: 6 }]).unwrap_err(),
            EngineError::IncompatibleBatch {
                position: 0,
                operation: "insertPageBreak",
                fault: BatchFault::OutOfBounds {
                    at: 6,
                    end_of_body: 5,
                },
            }
        );
    }

    #[test]
    fn replace_body_must_stand_alone() {
        let snapshot = snapshot_of_lines("abc\n");
        let replace = || EditIntent::ReplaceBody {
            content: vec![EditIntent::InsertText {
                at: 1,
                text: "new\n".into(),
            }],
        };

        assert!(sequence(&snapshot, [replace()]).is_ok());
        assert_eq!(
            sequence(
                &snapshot,
                [replace(), EditIntent::InsertPageBreak { at: 1 }]
            )
            .unwrap_err(),
            EngineError::IncompatibleBatch {
                position: 1,
                operation: "insertPageBreak",
                fault: BatchFault::ReplaceBodyNotAlone,
            }
        );
        assert!(matches!(
            sequence(&snapshot, [EditIntent::InsertPageBreak { at: 1 }, replace()]),
            Err(EngineError::IncompatibleBatch {
                position: 1,
                fault: BatchFault::ReplaceBodyNotAlone,
                ..
            })
        ));
    }

    #[test]
    fn nested_replacement_is_rejected() {
        let snapshot = snapshot_of_lines("abc\n");
        let nested = EditIntent::ReplaceBody {
            content: vec![EditIntent::ReplaceBody { content: vec![] }],
        };
        assert!(matches!(
            sequence(&snapshot, [nested]),
            Err(EngineError::IncompatibleBatch {
                fault: BatchFault::NestedReplaceBody,
                ..
            })
        ));
    }

    #[test]
    fn degenerate_payloads_are_rejected() {
        let snapshot = snapshot_of_lines("abc\n");
        let cases = [
            (
                EditIntent::InsertText {
                    at: 1,
                    text: String::new(),
                },
                BatchFault::EmptyInsert,
            ),
            (
                EditIntent::InsertTable {
                    at: 1,
                    rows: 0,
                    cols: 2,
                },
                BatchFault::EmptyTable,
            ),
            (
                EditIntent::ApplyTextStyle {
                    range: range(&snapshot, 1, 2),
                    patch: TextStylePatch::default(),
                },
                BatchFault::EmptyStyle,
            ),
        ];
        for (intent, expected) in cases {
            match sequence(&snapshot, [intent]) {
                Err(EngineError::IncompatibleBatch { fault, .. }) => assert_eq!(fault, expected),
                other => panic!("expected {expected:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn tables_shift_later_positions_by_cell_count() {
        let snapshot = snapshot_of_lines("abcdef\n");
        let batch = sequence(
            &snapshot,
            [
                EditIntent::InsertTable {
                    at: 2,
                    rows: 2,
                    cols: 3,
                },
                EditIntent::InsertPageBreak { at: 4 },
            ],
        )
        .unwrap();
        assert_eq!(
            spans(&batch),
            vec![("insertTable", 2, 2), ("insertPageBreak", 10, 10)]
        );
    }

    #[test]
    fn shift_map_forgets_inserts_swallowed_by_a_delete() {
        let mut shifts = ShiftMap::default();
        shifts.record_insert(6, 2);
        shifts.record_insert(4, 1);
        shifts.record_insert(9, 3);
        shifts.record_delete(4, 9);
        assert_eq!(shifts.inserts, vec![(4, 1), (9, 3)]);
        assert_eq!(shifts.map(9), 8);
        assert_eq!(shifts.map_end(9), 5);
        assert_eq!(shifts.map(10), 9);
    }

    #[test]
    fn delete_over_an_earlier_insert_keeps_later_ranges_on_their_text() {
        // '9' sits at original index 10.
        let snapshot = snapshot_of_lines("0123456789abc\n");
        let batch = sequence(
            &snapshot,
            [
                EditIntent::InsertText {
                    at: 6,
                    text: "XY".into(),
                },
                EditIntent::DeleteRange {
                    range: range(&snapshot, 4, 9),
                },
                EditIntent::ApplyTextStyle {
                    range: range(&snapshot, 10, 11),
                    patch: TextStylePatch::bold(),
                },
            ],
        )
        .unwrap();
        assert_eq!(
            spans(&batch),
            vec![
                ("insertText", 6, 8),
                ("deleteRange", 4, 11),
                ("applyTextStyle", 5, 6),
            ]
        );
    }

    #[test]
    fn delete_ending_at_an_earlier_insert_leaves_it_in_place() {
        let snapshot = snapshot_of_lines("0123456789abc\n");
        let batch = sequence(
            &snapshot,
            [
                EditIntent::InsertText {
                    at: 9,
                    text: "XY".into(),
                },
                EditIntent::DeleteRange {
                    range: range(&snapshot, 4, 9),
                },
                EditIntent::ApplyTextStyle {
                    range: range(&snapshot, 10, 11),
                    patch: TextStylePatch::bold(),
                },
            ],
        )
        .unwrap();
        assert_eq!(
            spans(&batch),
            vec![
                ("insertText", 9, 11),
                ("deleteRange", 4, 9),
                ("applyTextStyle", 7, 8),
            ]
        );
    }
}
