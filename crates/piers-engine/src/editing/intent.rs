use serde::Serialize;

use crate::resolve::Range;
use crate::tree::{ListKind, NamedStyle, text_len};

/// One atomic, not-yet-applied edit.
///
/// Positions refer to the snapshot the intent was resolved against, except
/// inside [`EditIntent::ReplaceBody`], whose content is laid out against an
/// empty body starting at index 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditIntent {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: Range,
    },
    ApplyTextStyle {
        range: Range,
        patch: TextStylePatch,
    },
    ApplyParagraphStyle {
        range: Range,
        patch: ParagraphStylePatch,
    },
    InsertTable {
        at: usize,
        rows: usize,
        cols: usize,
    },
    InsertPageBreak {
        at: usize,
    },
    InsertImage {
        at: usize,
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
    ReplaceBody {
        content: Vec<EditIntent>,
    },
}

impl EditIntent {
    /// Operation name used in error reports.
    pub fn name(&self) -> &'static str {
        match self {
            EditIntent::InsertText { .. } => "insertText",
            EditIntent::DeleteRange { .. } => "deleteRange",
            EditIntent::ApplyTextStyle { .. } => "applyTextStyle",
            EditIntent::ApplyParagraphStyle { .. } => "applyParagraphStyle",
            EditIntent::InsertTable { .. } => "insertTable",
            EditIntent::InsertPageBreak { .. } => "insertPageBreak",
            EditIntent::InsertImage { .. } => "insertImage",
            EditIntent::ReplaceBody { .. } => "replaceBody",
        }
    }

    /// Insertion point, for intents that add content.
    pub fn insertion_point(&self) -> Option<usize> {
        match self {
            EditIntent::InsertText { at, .. }
            | EditIntent::InsertTable { at, .. }
            | EditIntent::InsertPageBreak { at }
            | EditIntent::InsertImage { at, .. } => Some(*at),
            _ => None,
        }
    }

    /// Range targeted, for intents that address existing content.
    pub fn range(&self) -> Option<Range> {
        match self {
            EditIntent::DeleteRange { range }
            | EditIntent::ApplyTextStyle { range, .. }
            | EditIntent::ApplyParagraphStyle { range, .. } => Some(*range),
            _ => None,
        }
    }

    /// Net change in body length once this intent is applied.
    ///
    /// A new table holds one empty paragraph per cell; page breaks and images
    /// are single placeholders. A body replacement has no meaningful delta
    /// since nothing can follow it in a batch.
    pub fn length_delta(&self) -> isize {
        match self {
            EditIntent::InsertText { text, .. } => text_len(text) as isize,
            EditIntent::DeleteRange { range } => -(range.len() as isize),
            EditIntent::ApplyTextStyle { .. } | EditIntent::ApplyParagraphStyle { .. } => 0,
            EditIntent::InsertTable { rows, cols, .. } => (rows * cols) as isize,
            EditIntent::InsertPageBreak { .. } | EditIntent::InsertImage { .. } => 1,
            EditIntent::ReplaceBody { .. } => 0,
        }
    }
}

/// Character formatting to set. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStylePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Hex colour such as `#FF0000`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
}

impl TextStylePatch {
    pub fn bold() -> Self {
        Self {
            bold: Some(true),
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: Some(true),
            ..Self::default()
        }
    }

    pub fn strikethrough() -> Self {
        Self {
            strikethrough: Some(true),
            ..Self::default()
        }
    }

    pub fn link(url: impl Into<String>) -> Self {
        Self {
            link_url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alignment {
    Start,
    Center,
    End,
    Justified,
}

impl Alignment {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "START" => Some(Self::Start),
            "CENTER" => Some(Self::Center),
            "END" => Some(Self::End),
            "JUSTIFIED" => Some(Self::Justified),
            _ => None,
        }
    }
}

/// Paragraph formatting to set. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStylePatch {
    #[serde(rename = "namedStyleType", skip_serializing_if = "Option::is_none")]
    pub named_style: Option<NamedStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    /// Points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_above: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_below: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_with_next: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<ListKind>,
}

impl ParagraphStylePatch {
    pub fn named(style: NamedStyle) -> Self {
        Self {
            named_style: Some(style),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
