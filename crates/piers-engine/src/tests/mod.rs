//! Shared builders and invariant checks for unit tests.

use crate::tree::offsets::{OffsetMap, offsets};
use crate::tree::{Snapshot, StructuralElement, Table, TableCell, TableRow};

pub fn snapshot_of(body: Vec<StructuralElement>) -> Snapshot {
    Snapshot::new("doc-1", None, body)
}

/// Snapshot whose body is one paragraph per line of `text`, newlines kept.
pub fn snapshot_of_lines(text: &str) -> Snapshot {
    snapshot_of(
        text.split_inclusive('\n')
            .map(StructuralElement::paragraph)
            .collect(),
    )
}

/// A table of single-paragraph cells.
pub fn table(rows: &[&[&str]]) -> StructuralElement {
    StructuralElement::Table(Table {
        rows: rows
            .iter()
            .map(|cells| TableRow {
                cells: cells.iter().map(|text| TableCell::text(*text)).collect(),
            })
            .collect(),
    })
}

/// `top\n`, a table whose middle cell holds another table, then `end\n`.
pub fn nested_table_snapshot() -> Snapshot {
    let inner = table(&[&["deep\n"]]);
    let outer = StructuralElement::Table(Table {
        rows: vec![TableRow {
            cells: vec![
                TableCell::text("left\n"),
                TableCell {
                    content: vec![inner],
                },
                TableCell::text("right\n"),
            ],
        }],
    });
    snapshot_of(vec![
        StructuralElement::paragraph("top\n"),
        outer,
        StructuralElement::paragraph("end\n"),
    ])
}

/// Validates the offset map of `snapshot`.
///
/// Asserts that:
/// - The first leaf starts at index 1
/// - Leaves are contiguous and non-overlapping
/// - The final bound equals the end-of-body index
///
/// # Panics
/// Panics with a descriptive message if any invariant is violated.
pub fn check(snapshot: &Snapshot) {
    let mut expected = 1;
    for (leaf, start) in offsets(snapshot) {
        assert_eq!(
            start, expected,
            "leaf {leaf:?} starts at {start}, expected {expected}"
        );
        expected = start + leaf.len();
    }
    let end = OffsetMap::of(snapshot).end_index();
    assert_eq!(
        expected, end,
        "final bound {expected} does not match end of body {end}"
    );
}

#[test]
fn builders_produce_consistent_offsets() {
    check(&snapshot_of(vec![]));
    check(&snapshot_of_lines("one\ntwo\n"));
    check(&nested_table_snapshot());
}
