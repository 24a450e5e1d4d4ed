//! # Markup Translator
//!
//! Translates a minimal markdown-like grammar into ordered edit intents, and
//! renders a snapshot back into the same grammar.
//!
//! Each non-blank line becomes one paragraph: an insert of its visible text
//! plus `\n`, a paragraph style over that range, then one text style per
//! inline span. Translation never fails; anything the grammar does not
//! recognise is inserted as literal text.
//!
//! ## Modules
//!
//! - **`lines`**: heading, list and plain line productions
//! - **`inline`**: cursor-based parser for bold, italic, strike and links
//! - **`cursor`**: byte cursor used by the inline parser
//! - **`kinds`**: delimiter constants
//! - **`render`**: snapshot back to markup

pub mod cursor;
pub mod inline;
pub mod kinds;
pub mod lines;
pub mod render;

pub use render::to_markup;

use crate::editing::{EditIntent, ParagraphStylePatch};
use crate::resolve::Range;
use crate::tree::offsets::FIRST_INDEX;
use crate::tree::{ListKind, NamedStyle, text_len};
use inline::flatten;
use lines::{LineKind, classify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Index the first inserted character lands on.
    pub start_index: usize,
    /// Give a leading level-1 heading the title style instead.
    pub first_heading_as_title: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            start_index: FIRST_INDEX,
            first_heading_as_title: false,
        }
    }
}

/// Translator output anchored at one index.
///
/// Intents are laid out in application order: each one addresses the
/// document as left by the intents before it, starting from `anchor`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    anchor: usize,
    intents: Vec<EditIntent>,
    length: usize,
}

impl Fragment {
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// Characters the fragment adds once applied.
    pub fn length(&self) -> usize {
        self.length
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
}

pub fn translate(markup: &str, options: &TranslateOptions) -> Fragment {
    let mut intents = vec![];
    let mut at = options.start_index;

    for (n, line) in markup.lines().filter_map(classify).enumerate() {
        let inline = flatten(line.content);
        let text = format!("{}\n", inline.text);
        let len = text_len(&text);

        intents.push(EditIntent::InsertText { at, text });
        intents.push(EditIntent::ApplyParagraphStyle {
            range: Range::unbound(at, at + len),
            patch: paragraph_patch(line.kind, n == 0 && options.first_heading_as_title),
        });
        intents.extend(inline.spans.into_iter().map(|span| {
            EditIntent::ApplyTextStyle {
                range: Range::unbound(at + span.start, at + span.end),
                patch: span.patch,
            }
        }));
        at += len;
    }

    Fragment {
        anchor: options.start_index,
        intents,
        length: at - options.start_index,
    }
}

fn paragraph_patch(kind: LineKind, as_title: bool) -> ParagraphStylePatch {
    match kind {
        LineKind::Heading(1) if as_title => ParagraphStylePatch::named(NamedStyle::Title),
        LineKind::Heading(level) => ParagraphStylePatch::named(
            NamedStyle::heading(level).unwrap_or(NamedStyle::NormalText),
        ),
        LineKind::Bulleted => list_patch(ListKind::Bulleted),
        LineKind::Numbered => list_patch(ListKind::Numbered),
        LineKind::Plain => ParagraphStylePatch::named(NamedStyle::NormalText),
    }
}

fn list_patch(kind: ListKind) -> ParagraphStylePatch {
    ParagraphStylePatch {
        bullet: Some(kind),
        ..ParagraphStylePatch::named(NamedStyle::NormalText)
    }
}
