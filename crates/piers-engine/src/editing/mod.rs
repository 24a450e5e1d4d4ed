/*!
 * # Editing
 *
 * Edits are never applied by the engine. They are described as
 * [`EditIntent`]s resolved against one snapshot, then sequenced into an
 * [`EditBatch`] whose positions stay consistent when the batch is applied in
 * order by a provider.
 *
 * ## Sequencing model
 *
 * - Every intent addresses the **original** snapshot, never the document as
 *   it will look after earlier intents.
 * - Inserting `k` characters at `p` moves every later index `>= p` by `+k`.
 * - Deleting `[a, b)` moves later indices `>= b` by `-(b - a)` and collapses
 *   indices inside the range onto `a`. Overlapping deletes count each
 *   character once.
 * - A later delete also removes text inserted strictly inside it by an
 *   earlier intent. Text inserted exactly at either end survives, and range
 *   ends stop before text inserted at them.
 * - Style changes never move anything.
 * - A later range that collapses to nothing is dropped from the batch.
 * - A body replacement must be the only intent in its batch.
 *
 * ## Module Structure
 *
 * - **`intent`**: `EditIntent` and the style patches it carries
 * - **`sequencer`**: `ShiftMap`, `Sequencer` and the `EditBatch` it produces
 *
 * ## Usage Pattern
 *
 * ```rust
 * use piers_engine::editing::{EditIntent, TextStylePatch, sequence};
 * use piers_engine::resolve::{Target, resolve};
 * use piers_engine::tree::{Snapshot, StructuralElement};
 *
 * let snapshot = Snapshot::new("doc", None, vec![StructuralElement::paragraph("Hello world\n")]);
 * let world = resolve(&snapshot, &Target::search("world")).unwrap();
 *
 * let batch = sequence(&snapshot, [
 *     EditIntent::InsertText { at: 1, text: "Oh, ".into() },
 *     EditIntent::ApplyTextStyle { range: world, patch: TextStylePatch::bold() },
 * ])
 * .unwrap();
 *
 * // "world" moved right by the four inserted characters.
 * assert_eq!(batch.intents()[1].range().map(|r| r.start()), Some(11));
 * ```
 */

pub mod intent;
pub mod sequencer;

pub use intent::{Alignment, EditIntent, ParagraphStylePatch, TextStylePatch};
pub use sequencer::{EditBatch, Sequencer, ShiftMap, sequence};
